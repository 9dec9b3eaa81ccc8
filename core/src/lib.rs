pub mod cpu;
pub mod device;
pub mod disasm;
pub mod image;
pub mod machine;

pub mod prelude {
    pub use crate::cpu::{Dcpu, Reg};
    pub use crate::device::clock::Clock;
    pub use crate::device::keyboard::{KeySource, Keyboard};
    pub use crate::device::lem::{Frame, Lem, Screen};
    pub use crate::device::Device;
    pub use crate::machine::{Action, Machine};
}
