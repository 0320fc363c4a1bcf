use std::fmt;

#[derive(Clone)]
pub struct Credentials {
    pub email_or_phone: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email_or_phone: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email_or_phone: email_or_phone.into().trim().to_string(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email_or_phone", &self.email_or_phone)
            .field("password", &"********")
            .finish()
    }
}
