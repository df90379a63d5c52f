//! The API endpoints URIs.

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/auth/log_out";
/// The route for listing the transaction categories.
pub const CATEGORIES: &str = "/categories";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for the dashboard statistics.
pub const DASHBOARD_STATS: &str = "/dashboard/stats";
/// The route for reading and updating the user's profile.
pub const PROFILE: &str = "/user/profile";
/// The route for completing the onboarding step after registration.
pub const ONBOARDING: &str = "/user/onboarding";
