/// Router Module Index
///
/// Splits the blog's routes by who may reach them. Access control is attached at the
/// router level in `create_router`, so a handler can never be exposed by accident.

/// Pages anyone can read: the category feeds, `/all` and single articles.
pub mod public;

/// Article management and the admin panel. Wrapped in the authentication layer.
pub mod authenticated;

/// Session endpoints nested under `/admin` (login and logout).
pub mod admin;
