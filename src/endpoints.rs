//! The API endpoints URIs.

/// The root route which serves the landing page.
pub const ROOT: &str = "/";

/// The route for creating an account.
pub const REGISTER: &str = "/api/register";
/// The route for logging in.
pub const LOG_IN: &str = "/api/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/logout";
/// The route to record an expense.
pub const ADD_EXPENSE: &str = "/api/add_expense";
/// The route to list the most recent expenses.
pub const GET_EXPENSES: &str = "/api/get_expenses";
/// The route for the logged-in user's account details.
pub const GET_USER_DETAILS: &str = "/api/get_user_details";
/// The route for spending totals per category.
pub const GET_INSIGHTS: &str = "/api/get_insights";
/// The route to ask the savings advisor a question.
pub const CHAT: &str = "/api/chat";
