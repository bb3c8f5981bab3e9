pub mod decode;
pub mod spectrum;
pub mod transcode;
pub mod window;
