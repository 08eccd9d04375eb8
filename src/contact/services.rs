use super::dto::{ContactRequest, PartnerInquiryRequest};
use crate::mailer::OutgoingEmail;

pub fn contact_email(inbox: &str, req: &ContactRequest) -> OutgoingEmail {
    let subject = req
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("General inquiry");
    OutgoingEmail {
        to: inbox.to_string(),
        subject: format!("Contact form: {subject}"),
        body: format!(
            "Name: {}\nEmail: {}\nPhone: {}\n\n{}\n",
            req.name.trim(),
            req.email.trim(),
            req.phone.as_deref().unwrap_or("-"),
            req.message.trim(),
        ),
        reply_to: Some(req.email.trim().to_string()),
    }
}

pub fn partner_inquiry_email(inbox: &str, req: &PartnerInquiryRequest) -> OutgoingEmail {
    OutgoingEmail {
        to: inbox.to_string(),
        subject: format!("Partnership inquiry: {}", req.company.trim()),
        body: format!(
            "Company: {}\nContact: {}\nEmail: {}\nPhone: {}\n\n{}\n",
            req.company.trim(),
            req.name.trim(),
            req.email.trim(),
            req.phone.as_deref().unwrap_or("-"),
            req.message.trim(),
        ),
        reply_to: Some(req.email.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_email_defaults_subject_and_replies_to_sender() {
        let req = ContactRequest {
            name: "Ada".into(),
            email: " ada@example.com ".into(),
            phone: None,
            subject: Some("  ".into()),
            message: "Need a jet to Aspen".into(),
        };
        let mail = contact_email("ops@example.com", &req);
        assert_eq!(mail.to, "ops@example.com");
        assert_eq!(mail.subject, "Contact form: General inquiry");
        assert_eq!(mail.reply_to.as_deref(), Some("ada@example.com"));
        assert!(mail.body.contains("Phone: -"));
        assert!(mail.body.ends_with("Need a jet to Aspen\n"));
    }
}
