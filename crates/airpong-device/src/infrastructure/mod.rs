//! Infrastructure layer: radio transports, the UI event bridge, and
//! configuration storage.

pub mod radio;
pub mod storage;
pub mod ui_bridge;
