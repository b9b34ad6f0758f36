use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use static_assertions::assert_impl_all;

use crate::{
    AreaComputation, Construct, ConstructError, HostMesh, Operation, ParameterBag, Passthrough,
    SurfaceSegmentation, SurfaceSimplification,
};

/// Builds an operation from the parameters and mesh of a request.
pub type Constructor = dyn Fn(&ParameterBag, Option<&HostMesh>) -> Result<Box<dyn Operation>, ConstructError>
    + Send
    + Sync;

/// Immutable map from operation name to constructor.
pub struct Registry {
    constructors: BTreeMap<String, Box<Constructor>>,
}

assert_impl_all!(Registry: Send, Sync);

static STANDARD: OnceLock<Registry> = OnceLock::new();

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            constructors: BTreeMap::new(),
        }
    }

    /// `segmentation`, `simplification`, `area_computation` and `test`.
    pub fn standard() -> Self {
        Self::builder()
            .with::<SurfaceSegmentation>()
            .with::<SurfaceSimplification>()
            .with::<AreaComputation>()
            .with::<Passthrough>()
            .build()
    }

    /// Process wide instance of [`Registry::standard`], built on first use.
    pub fn global() -> &'static Registry {
        STANDARD.get_or_init(Registry::standard)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub(crate) fn constructor(&self, name: &str) -> Option<&Constructor> {
        self.constructors.get(name).map(Box::as_ref)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

pub struct RegistryBuilder {
    constructors: BTreeMap<String, Box<Constructor>>,
}

impl RegistryBuilder {
    /// Registers `constructor` under `name`, replacing any earlier registration.
    pub fn register<S, F>(mut self, name: S, constructor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&ParameterBag, Option<&HostMesh>) -> Result<Box<dyn Operation>, ConstructError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
        self
    }

    pub fn with<T: Construct>(self) -> Self {
        self.register(T::NAME, |parameters, mesh| {
            let operation: Box<dyn Operation> = Box::new(T::construct(parameters, mesh)?);
            Ok(operation)
        })
    }

    pub fn build(self) -> Registry {
        Registry {
            constructors: self.constructors,
        }
    }
}
