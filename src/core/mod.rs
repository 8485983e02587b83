//! Engine core: facade, execution queue and process runner.
//!
//! The only public API from this module is [`Brew`] and its [`BrewBuilder`].
//!
//! Internal modules:
//! - [`brew`]: the facade; owns configuration and snapshots it per submission;
//! - [`queue`]: FIFO admission, dispatch and cancellation bookkeeping;
//! - [`runner`]: runs one entry's process with output relay and cancellation;
//! - [`admission`]: serial/concurrent admission rule of one entry;
//! - [`entry`]: queue entry and the job handed to a runner task.

mod admission;
mod brew;
mod builder;
mod entry;
mod queue;
mod runner;

pub use brew::Brew;
pub use builder::BrewBuilder;
