pub mod config;
pub mod hosts;
pub mod logger;

// 重新导出常用函数到 modules 命名空间顶级，方便外部调用
pub use config::load_app_config;
pub use hosts::fetch_config;
pub use logger::init_logger;
