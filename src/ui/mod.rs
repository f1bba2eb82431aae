pub mod progress;

pub use progress::AssemblyUI;
