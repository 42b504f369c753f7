//! The application life-cycle driver.
//!
//! An [`Engine`] owns an ordered list of [`Subsystem`]s and drives them
//! through init → start → repeated update → shutdown. The list order is the
//! dependency order (window before renderer before timer) and is frozen once
//! the engine runs.
//!
//! # Frame loop
//!
//! While running, each iteration calls `update()` on every subsystem in list
//! order. The first subsystem to return [`Flow::Halt`] ends the iteration
//! immediately — subsystems later in the list are not updated that frame —
//! and moves the engine into its shutdown phase, where every subsystem's
//! `shutdown()` runs best-effort in list order.

use anyhow::{Context, Result, bail};

/// Continue-or-stop signal returned by [`Subsystem::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// A life-cycle participant driven by the [`Engine`].
///
/// Subsystems move through four phases:
///
/// 1. `init()` before the window appears,
/// 2. `start()` once every subsystem is initialised,
/// 3. `update()` once per frame while the engine runs,
/// 4. `shutdown()` during termination.
///
/// `init` and `start` failures are fatal and abort the run without rollback;
/// `shutdown` failures are logged and do not prevent the remaining
/// subsystems from shutting down.
pub trait Subsystem {
    /// Short name used in life-cycle diagnostics.
    fn name(&self) -> &'static str;

    /// Initialise the subsystem.
    fn init(&mut self) -> Result<()>;

    /// Post-initialisation tasks. All other subsystems are initialised.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once per frame within the main loop. Returning [`Flow::Halt`]
    /// shuts the engine down.
    fn update(&mut self) -> Result<Flow>;

    /// Termination and de-allocation tasks.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Observable engine life-cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Initializing,
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

/// The life-cycle driver.
///
/// ```no_run
/// use glint2d::engine::{Engine, Flow, Subsystem};
///
/// struct Noop;
/// impl Subsystem for Noop {
///     fn name(&self) -> &'static str { "Noop" }
///     fn init(&mut self) -> anyhow::Result<()> { Ok(()) }
///     fn update(&mut self) -> anyhow::Result<Flow> { Ok(Flow::Halt) }
/// }
///
/// let mut engine = Engine::new();
/// engine.add_subsystem(Box::new(Noop))?;
/// engine.run()?;
/// # anyhow::Ok(())
/// ```
pub struct Engine {
    subsystems: Vec<Box<dyn Subsystem>>,
    state: EngineState,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            subsystems: Vec::new(),
            state: EngineState::NotStarted,
        }
    }

    /// Current life-cycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Append a subsystem to the update order.
    ///
    /// The list is frozen once [`run`](Self::run) has been called; adding a
    /// subsystem afterwards is a configuration error.
    pub fn add_subsystem(&mut self, subsystem: Box<dyn Subsystem>) -> Result<()> {
        if self.state != EngineState::NotStarted {
            bail!("subsystems cannot be added once the engine has started");
        }
        self.subsystems.push(subsystem);
        Ok(())
    }

    /// Drive the full life-cycle: init and start every subsystem in list
    /// order, loop over `update()` until a subsystem halts, then shut
    /// everything down in list order.
    ///
    /// Calling `run` a second time on the same instance is a fatal
    /// configuration error, whatever state the first call reached.
    pub fn run(&mut self) -> Result<()> {
        if self.state != EngineState::NotStarted {
            bail!("duplicate call to Engine::run, the engine is already running");
        }
        if self.subsystems.is_empty() {
            bail!("the engine has no subsystems to run");
        }
        // A host application may have installed its own logger already.
        let _ = env_logger::try_init();

        self.state = EngineState::Initializing;
        for subsystem in self.subsystems.iter_mut() {
            subsystem
                .init()
                .with_context(|| format!("failed to initialise subsystem {}", subsystem.name()))?;
        }

        self.state = EngineState::Starting;
        for subsystem in self.subsystems.iter_mut() {
            subsystem
                .start()
                .with_context(|| format!("failed to start subsystem {}", subsystem.name()))?;
        }

        self.state = EngineState::Running;
        let fatal = 'frames: loop {
            for subsystem in self.subsystems.iter_mut() {
                match subsystem.update() {
                    Ok(Flow::Continue) => (),
                    Ok(Flow::Halt) => {
                        log::info!(
                            "Application shutdown requested by subsystem: {}",
                            subsystem.name()
                        );
                        break 'frames None;
                    }
                    Err(e) => {
                        break 'frames Some(
                            e.context(format!("subsystem {} failed during update", subsystem.name())),
                        );
                    }
                }
            }
        };

        self.state = EngineState::ShuttingDown;
        for subsystem in self.subsystems.iter_mut() {
            if let Err(e) = subsystem.shutdown() {
                log::error!("Subsystem {} failed to shut down: {e:#}", subsystem.name());
            }
        }
        self.state = EngineState::Terminated;

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HaltImmediately;

    impl Subsystem for HaltImmediately {
        fn name(&self) -> &'static str {
            "HaltImmediately"
        }

        fn init(&mut self) -> Result<()> {
            Ok(())
        }

        fn update(&mut self) -> Result<Flow> {
            Ok(Flow::Halt)
        }
    }

    #[test]
    fn run_without_subsystems_is_an_error() {
        let mut engine = Engine::new();
        assert!(engine.run().is_err());
    }

    #[test]
    fn duplicate_run_is_fatal() {
        let mut engine = Engine::new();
        engine.add_subsystem(Box::new(HaltImmediately)).unwrap();
        engine.run().unwrap();
        assert_eq!(engine.state(), EngineState::Terminated);
        assert!(engine.run().is_err());
    }

    #[test]
    fn subsystems_are_frozen_once_running() {
        let mut engine = Engine::new();
        engine.add_subsystem(Box::new(HaltImmediately)).unwrap();
        engine.run().unwrap();
        assert!(engine.add_subsystem(Box::new(HaltImmediately)).is_err());
    }

    #[test]
    fn failed_init_aborts_without_reaching_update() {
        struct BrokenInit;
        impl Subsystem for BrokenInit {
            fn name(&self) -> &'static str {
                "BrokenInit"
            }
            fn init(&mut self) -> Result<()> {
                bail!("out of luck")
            }
            fn update(&mut self) -> Result<Flow> {
                panic!("update must not run after a failed init");
            }
        }

        let mut engine = Engine::new();
        engine.add_subsystem(Box::new(BrokenInit)).unwrap();
        let err = engine.run().unwrap_err();
        assert!(err.to_string().contains("BrokenInit"));
    }
}
