pub mod login;

#[derive(Debug)]
pub enum Action {
    Login {
        api_url: String,
        email: Option<String>,
    },
}
