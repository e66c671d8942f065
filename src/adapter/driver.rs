// 駆動する側アダプター（対話型コンソール）

pub mod console;
pub mod console_view;

pub use console::ConsoleShell;
