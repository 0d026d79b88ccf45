pub mod cell;
pub mod compiler;
pub mod encoded;
pub mod encoder;
pub mod op_code;
pub mod optimize;
pub mod verify;
