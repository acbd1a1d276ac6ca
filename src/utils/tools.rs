use crate::error::Error;
use rpassword::prompt_password;

pub fn get_password(username: &str) -> Result<String, Error> {
    prompt_password(format!("Enter password for {}: ", username)).map_err(Error::PasswordPrompt)
}
