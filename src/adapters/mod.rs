// Adapters layer: ports 的具體實作與本機輸出目錄

pub mod archive;
pub mod render;
pub mod storage;
