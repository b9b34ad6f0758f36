use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single named value in a [`ParameterBag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Integers, and floats without a fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            ParamValue::Integer(i) => Some(i),
            ParamValue::Float(x) if x.is_finite() && x.fract() == 0.0 => Some(x as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Integer(i) => Some(i as f64),
            ParamValue::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Integer(i)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

/// Operation specific configuration, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag(BTreeMap<String, ParamValue>);

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<ParamValue>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with<K: Into<String>, V: Into<ParamValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for ParameterBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParamError {
    #[error("missing required parameter `{0}`")]
    Missing(&'static str),

    #[error("parameter `{name}` = {value} {expected}")]
    Invalid {
        name: &'static str,
        value: ParamValue,
        expected: Cow<'static, str>,
    },

    #[error("unknown parameter `{0}`")]
    Unknown(String),
}

/// Typed, validating access to a [`ParameterBag`].
///
/// Every getter marks its key as used; [`ParamReader::finish`] then rejects whatever
/// the operation did not ask for.
#[derive(Debug)]
pub struct ParamReader<'a> {
    bag: &'a ParameterBag,
    used: BTreeSet<&'static str>,
}

impl<'a> ParamReader<'a> {
    pub fn new(bag: &'a ParameterBag) -> Self {
        Self {
            bag,
            used: BTreeSet::new(),
        }
    }

    fn take(&mut self, name: &'static str) -> Option<&'a ParamValue> {
        self.used.insert(name);
        self.bag.get(name)
    }

    fn require(&mut self, name: &'static str) -> Result<&'a ParamValue, ParamError> {
        self.take(name).ok_or(ParamError::Missing(name))
    }

    /// An integer in `min..=max`.
    pub fn integer_in(
        &mut self,
        name: &'static str,
        min: usize,
        max: usize,
    ) -> Result<usize, ParamError> {
        let value = self.require(name)?;
        match value.as_integer().and_then(|i| usize::try_from(i).ok()) {
            Some(i) if (min..=max).contains(&i) => Ok(i),
            _ => Err(invalid(
                name,
                value,
                format!("must be an integer in [{}, {}]", min, max),
            )),
        }
    }

    pub fn non_negative_float(&mut self, name: &'static str) -> Result<f64, ParamError> {
        let value = self.require(name)?;
        match value.as_f64() {
            Some(x) if x.is_finite() && x >= 0.0 => Ok(x),
            _ => Err(invalid(name, value, "must be a non-negative number")),
        }
    }

    /// A number in `(0, 1]`.
    pub fn fraction(&mut self, name: &'static str) -> Result<f64, ParamError> {
        let value = self.require(name)?;
        match value.as_f64() {
            Some(x) if x > 0.0 && x <= 1.0 => Ok(x),
            _ => Err(invalid(name, value, "must be a number in (0, 1]")),
        }
    }

    /// One of a fixed set of strings, or `default` when the key is absent.
    pub fn choice<T: Copy>(
        &mut self,
        name: &'static str,
        options: &[(&str, T)],
        default: T,
    ) -> Result<T, ParamError> {
        let Some(value) = self.take(name) else {
            return Ok(default);
        };
        value
            .as_str()
            .and_then(|s| options.iter().find(|(o, _)| *o == s))
            .map(|&(_, t)| t)
            .ok_or_else(|| invalid(name, value, "is not a recognized option"))
    }

    /// Fails on the first key no getter asked for.
    pub fn finish(self) -> Result<(), ParamError> {
        match self
            .bag
            .iter()
            .find(|(k, _)| !self.used.iter().any(|u| u == k))
        {
            Some((k, _)) => Err(ParamError::Unknown(k.to_string())),
            None => Ok(()),
        }
    }
}

fn invalid<E: Into<Cow<'static, str>>>(name: &'static str, value: &ParamValue, expected: E) -> ParamError {
    ParamError::Invalid {
        name,
        value: value.clone(),
        expected: expected.into(),
    }
}
