pub mod debugger;
pub mod interp;
pub mod ui;
