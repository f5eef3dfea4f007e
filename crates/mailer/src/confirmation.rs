use shared::protocol::SignupNotice;
use url::Url;

use crate::OutgoingEmail;

pub const CONFIRMATION_SUBJECT: &str = "You are on the SkillBridge Waitlist!";

pub fn render_confirmation(notice: &SignupNotice, from: &str, unsubscribe: &Url) -> OutgoingEmail {
    let role = escape_html(notice.role.as_str());
    let organization = escape_html(&notice.organization);
    let unsubscribe = escape_html(unsubscribe.as_str());

    let html = format!(
        r#"<div style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; padding: 40px 20px; background-color: #fafafa; color: #0f172a;">
  <div style="background-color: #ffffff; padding: 40px 30px; border-radius: 16px; border: 1px solid #e2e8f0; max-width: 500px; margin: 0 auto;">
    <h1 style="color: #2563eb; font-size: 26px; text-align: center;">SkillBridge</h1>
    <h2 style="font-size: 20px;">You're on the list!</h2>
    <p>Thank you for registering your interest in SkillBridge. We're actively building the platform and are thrilled to have you join our early waitlist.</p>
    <div style="background-color: #f1f5f9; padding: 16px; border-radius: 8px;">
      <p><strong>Registration Details:</strong></p>
      <ul>
        <li><strong>Role:</strong> {role}</li>
        <li><strong>Organization:</strong> {organization}</li>
      </ul>
    </div>
    <p>We'll be sure to notify you when early access becomes available.</p>
    <div style="border-top: 1px solid #e2e8f0; padding-top: 24px; text-align: center; font-size: 13px; color: #94a3b8;">
      <p>You are receiving this email because you registered for the SkillBridge waitlist.</p>
      <p><a href="{unsubscribe}" style="color: #64748b;">Unsubscribe</a> from this list.</p>
    </div>
  </div>
</div>"#
    );

    OutgoingEmail {
        from: format!("SkillBridge Waitlist <{from}>"),
        to: vec![notice.email.clone()],
        subject: CONFIRMATION_SUBJECT.to_string(),
        html,
    }
}

/// Organization names are free text typed by the signup, so they must not inject markup.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::Role;

    fn notice(organization: &str) -> SignupNotice {
        SignupNotice {
            email: "a@uni.ac.uk".to_string(),
            organization: organization.to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn confirmation_addresses_the_signup_and_links_unsubscribe() {
        let link = Url::parse("https://skillbridge.example/unsubscribe?email=a%40uni.ac.uk")
            .expect("url");
        let email = render_confirmation(
            &notice("University of Bath"),
            "hello@skillbridge.example",
            &link,
        );

        assert_eq!(email.to, vec!["a@uni.ac.uk".to_string()]);
        assert_eq!(email.from, "SkillBridge Waitlist <hello@skillbridge.example>");
        assert_eq!(email.subject, CONFIRMATION_SUBJECT);
        assert!(email.html.contains("<strong>Role:</strong> Student"));
        assert!(email.html.contains("University of Bath"));
        assert!(email
            .html
            .contains(r#"href="https://skillbridge.example/unsubscribe?email=a%40uni.ac.uk""#));
    }

    #[test]
    fn organization_markup_is_escaped() {
        let link = Url::parse("https://skillbridge.example/unsubscribe").expect("url");
        let email = render_confirmation(&notice("<b>Acme</b> & Sons"), "x@y.io", &link);
        assert!(email.html.contains("&lt;b&gt;Acme&lt;/b&gt; &amp; Sons"));
        assert!(!email.html.contains("<b>Acme</b>"));
    }
}
