use std::mem;
use std::time::Instant;

use log::{debug, error, info};

use crate::{
    DispatchError, Operation, ParameterBag, Registry, Request, Result, ResultPayload, StateError,
};

#[derive(Debug)]
enum State {
    Constructed(Box<dyn Operation>),
    Executed(ResultPayload),
    Failed,
}

/// Owns the single operation of one request.
///
/// The protocol is `new`, then `run` once, then `collect_result`. Anything else is a
/// [`DispatcherState`](DispatchError::DispatcherState) error.
#[derive(Debug)]
pub struct Dispatcher {
    operation: String,
    parameters: ParameterBag,
    state: State,
}

impl Dispatcher {
    /// Looks up the operation and constructs it.
    ///
    /// Unknown names fail before any parameter or mesh is looked at.
    pub fn new(registry: &Registry, request: Request) -> Result<Self> {
        let Request {
            operation,
            parameters,
            mesh,
        } = request;
        let constructor = registry
            .constructor(&operation)
            .ok_or_else(|| DispatchError::UnknownOperation(operation.clone()))?;

        debug!("constructing {} with {}", operation, parameters);
        let op = constructor(&parameters, mesh.as_ref())
            .map_err(|source| DispatchError::construct(&operation, &parameters, source))?;
        info!("constructed {}", operation);

        Ok(Self {
            operation,
            parameters,
            state: State::Constructed(op),
        })
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Executes the operation. Valid exactly once.
    pub fn run(&mut self) -> Result<()> {
        let op = match mem::replace(&mut self.state, State::Failed) {
            State::Constructed(op) => op,
            State::Executed(payload) => {
                self.state = State::Executed(payload);
                return Err(self.state_error(StateError::AlreadyRun));
            }
            State::Failed => return Err(self.state_error(StateError::RunFailed)),
        };

        let start = Instant::now();
        match op.execute() {
            Ok(payload) => {
                info!(
                    "{} finished in {:?}: {:?}",
                    self.operation,
                    start.elapsed(),
                    payload.tags()
                );
                self.state = State::Executed(payload);
                Ok(())
            }
            Err(source) => {
                error!(
                    "{} failed with parameters {}: {}",
                    self.operation, self.parameters, source
                );
                Err(DispatchError::GeometryFailure {
                    operation: self.operation.clone(),
                    parameters: self.parameters.clone(),
                    source,
                })
            }
        }
    }

    /// Hands over the payload of a successful [`run`](Dispatcher::run).
    pub fn collect_result(self) -> Result<ResultPayload> {
        match self.state {
            State::Executed(payload) => Ok(payload),
            State::Constructed(_) => Err(self.state_error(StateError::NotRun)),
            State::Failed => Err(self.state_error(StateError::RunFailed)),
        }
    }

    fn state_error(&self, source: StateError) -> DispatchError {
        DispatchError::DispatcherState {
            operation: self.operation.clone(),
            source,
        }
    }
}

/// Constructs, runs and collects in one go.
pub fn dispatch(registry: &Registry, request: Request) -> Result<ResultPayload> {
    let mut dispatcher = Dispatcher::new(registry, request)?;
    dispatcher.run()?;
    dispatcher.collect_result()
}
