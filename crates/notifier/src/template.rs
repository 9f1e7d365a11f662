//! Message templates.
//!
//! Wording is fixed; only the recipient name varies. Kept in Portuguese
//! as the congregation reads it.

/// The absence follow-up message sent to members not seen for a while.
pub fn absence_message(name: &str) -> String {
    format!(
        "Olá {name},\n\n\
         Sentimos sua falta em nossa igreja. Não o vemos há algumas semanas \
         e gostaríamos de saber se está tudo bem.\n\n\
         Se precisar de apoio ou oração, estamos aqui para você.\n\n\
         Que Deus abençoe!"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absence_message_addresses_the_member() {
        let message = absence_message("Maria");
        assert!(message.starts_with("Olá Maria,"));
        assert!(message.contains("Sentimos sua falta"));
    }
}
