//! Input tables for validation scenarios

/// An input the form must reject, with the scenario it represents
#[derive(Debug, Clone, Copy)]
pub struct InvalidInput {
    pub value: &'static str,
    pub scenario: &'static str,
}

pub const PASSWORD_ERROR: &str = "Password has to be from 8 to 15 characters long and contain \
     at least one integer, one capital, and one small letter";

pub const INVALID_PASSWORDS: [InvalidInput; 5] = [
    InvalidInput {
        value: "12345Pw",
        scenario: "too short password",
    },
    InvalidInput {
        value: "Aa92Aa92Aa92Aa92",
        scenario: "too long password",
    },
    InvalidInput {
        value: "password123456",
        scenario: "password with no uppercase letter",
    },
    InvalidInput {
        value: "PASSWORD12",
        scenario: "password with no lowercase letter",
    },
    InvalidInput {
        value: "Password",
        scenario: "password with no numbers",
    },
];

pub const EMAIL_ERROR: &str = "Email is incorrect";

pub const INVALID_EMAILS: [InvalidInput; 5] = [
    InvalidInput {
        value: "plainaddress",
        scenario: "missing @",
    },
    InvalidInput {
        value: "@missing-local.test",
        scenario: "missing local part",
    },
    InvalidInput {
        value: "missing-domain@",
        scenario: "missing domain",
    },
    InvalidInput {
        value: "two@@signs.test",
        scenario: "double @",
    },
    InvalidInput {
        value: "spaces in@address.test",
        scenario: "space in local part",
    },
];

/// Name-field scenarios: input and the exact expected message
pub const NAME_ERRORS: [(&str, &str); 5] = [
    ("", "Name required"),
    ("A", "Name has to be from 2 to 20 characters long"),
    (
        "WWWWWWWWWWWWWWWWWWWWW",
        "Name has to be from 2 to 20 characters long",
    ),
    ("Abiga\u{eb}lle", "Name is invalid"),
    ("666Test", "Name is invalid"),
];

pub const LAST_NAME_ERRORS: [(&str, &str); 4] = [
    ("", "Last name required"),
    ("l", "Last name has to be from 2 to 20 characters long"),
    (
        "WWWWWWWWWWWWWWWWWWWWW",
        "Last name has to be from 2 to 20 characters long",
    ),
    ("Kr\u{fc}ger", "Last name is invalid"),
];
