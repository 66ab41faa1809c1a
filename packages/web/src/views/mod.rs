mod admin;
mod home;
mod login;
mod signup;
mod upload;
mod watch;

pub use admin::Admin;
pub use home::Home;
pub use login::Login;
pub use signup::Signup;
pub use upload::Upload;
pub use watch::Watch;
