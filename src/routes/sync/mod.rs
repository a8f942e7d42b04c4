mod push;

pub use push::*;
