mod luma;
mod scripted;
#[cfg(feature = "backend-tract")]
mod tract;

pub use luma::LumaBackend;
pub use scripted::ScriptedBackend;
#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
