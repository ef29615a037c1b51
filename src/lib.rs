pub use kilroy_core::*;

#[cfg(feature = "server")]
pub mod server {
    pub use kilroy_server::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use kilroy_fs::*;
}

#[cfg(feature = "basic_auth")]
pub mod auth_basic {
    pub use kilroy_auth_basic::*;
}

pub mod prelude {
    pub use kilroy_core::prelude::*;

    #[cfg(feature = "server")]
    pub use kilroy_server::prelude::*;

    #[cfg(feature = "fs")]
    pub use kilroy_fs::FileSystemStorage;

    #[cfg(feature = "basic_auth")]
    pub use kilroy_auth_basic::TestUserStrategy;
}
