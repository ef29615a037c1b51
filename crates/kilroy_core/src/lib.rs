pub mod error;
pub mod identity;
pub mod resource;
pub mod traits;

pub mod prelude {
    pub use super::error::*;
    pub use super::identity::*;
    pub use super::resource::*;
    pub use super::traits::*;
}
