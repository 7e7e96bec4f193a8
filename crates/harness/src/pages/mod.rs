//! Capability-bound page objects
//!
//! Each page object wraps one live browser session with named actions and
//! queries over a fixed locator set. Actions that open a new view construct
//! and return the child page object bound to the same session; queries go
//! through bounded condition waits rather than fixed sleeps.

pub mod add_car;
pub mod edit_car;
pub mod garage;
pub mod home;
pub mod profile;
pub mod sign_in;
pub mod sign_up;

pub use add_car::AddCarForm;
pub use edit_car::{EditCarForm, RemoveCarDialog};
pub use garage::GaragePage;
pub use home::HomePage;
pub use profile::ProfilePage;
pub use sign_in::SignInForm;
pub use sign_up::{SignUpData, SignUpField, SignUpForm};
