//! Session orchestration: state, notices and the controller

mod controller;
mod state;

pub(crate) use controller::SessionController;
pub(crate) use state::{ActionKind, Notice};
