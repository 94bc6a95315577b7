pub mod assemble;
pub mod fence;
pub mod input;
pub mod lint;
pub mod merge;
pub mod password;
pub mod pipeline;
pub mod response;
pub mod service;
pub mod splice;
pub mod template;
