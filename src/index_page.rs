//! The landing page served at the root route.

use maud::{DOCTYPE, Markup, html};

use crate::endpoints;

const PAGE_STYLE: &str = "
    body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }
    code { background: #f2f2f2; padding: 0.1rem 0.3rem; border-radius: 0.2rem; }
    li { margin-bottom: 0.4rem; }
";

/// Render the landing page, which lists the routes of the API.
pub async fn get_index_page() -> Markup {
    let routes = [
        ("POST", endpoints::REGISTER, "Create an account."),
        ("POST", endpoints::LOG_IN, "Log in and start a session."),
        ("POST", endpoints::LOG_OUT, "End the current session."),
        ("POST", endpoints::ADD_EXPENSE, "Record an expense."),
        ("GET", endpoints::GET_EXPENSES, "Your five most recent expenses."),
        ("GET", endpoints::GET_USER_DETAILS, "Your account and balance."),
        ("GET", endpoints::GET_INSIGHTS, "Your spending per category."),
        ("POST", endpoints::CHAT, "Ask the savings advisor a question."),
    ];

    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Finity" }
                style { (PAGE_STYLE) }
            }

            body
            {
                h1 { "Finity" }
                p { "Track your spending, see where your money goes and get advice on how to save." }

                h2 { "API" }
                ul
                {
                    @for (method, path, description) in routes {
                        li { code { (method) " " (path) } " " (description) }
                    }
                }
            }
        }
    }
}
