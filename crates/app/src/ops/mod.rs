mod publish;
mod version;

pub use publish::Publish;
pub use version::Version;
