//! HTML email bodies: the internal staff notice and the customer
//! confirmation. Plain string interpolation over fixed markup; all
//! user-supplied values are escaped.

use crate::sample_request::SampleRequest;

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn shipping_html(request: &SampleRequest) -> String {
    let shipping = &request.shipping;
    let mut html = format!("<p>{}<br>\n", escape(&shipping.address1));
    if !shipping.address2.is_empty() {
        html.push_str(&format!("{}<br>\n", escape(&shipping.address2)));
    }
    html.push_str(&format!(
        "{}, {} {}<br>\n{}</p>",
        escape(&shipping.city),
        escape(&shipping.state),
        escape(&shipping.zip),
        escape(&shipping.country),
    ));
    html
}

pub fn internal_subject(request: &SampleRequest) -> String {
    format!("New Sample Request from {}", request.contact.company)
}

/// Staff-facing notice: full contact block, shipping address, the wine list
/// with producers, and any comments.
pub fn render_internal_notice(request: &SampleRequest) -> String {
    let contact = &request.contact;

    let wine_items: String = request
        .wines
        .iter()
        .map(|w| {
            format!(
                "<li><strong>{}</strong> - {} ({})</li>\n",
                escape(&w.name),
                escape(&w.producer),
                escape(&w.region),
            )
        })
        .collect();

    let comments_html = if request.comments.is_empty() {
        String::new()
    } else {
        format!("<h3>Comments</h3><p>{}</p>\n", escape(&request.comments))
    };

    format!(
        r#"<h2>New Sample Request Received</h2>

<h3>Contact Information</h3>
<p><strong>Company:</strong> {company}<br>
<strong>Contact:</strong> {contact_name}<br>
<strong>Email:</strong> <a href="mailto:{email}">{email}</a><br>
<strong>Phone:</strong> {phone}</p>

<h3>Shipping Address</h3>
{shipping}

<h3>Wines Requested ({count})</h3>
<ul>
{wine_items}</ul>

{comments_html}<p style="color: #666; font-size: 12px;">Submitted: {submitted}</p>
"#,
        company = escape(&contact.company),
        contact_name = escape(&contact.full_name()),
        email = escape(&contact.email),
        phone = escape(&contact.phone),
        shipping = shipping_html(request),
        count = request.wines.len(),
        wine_items = wine_items,
        comments_html = comments_html,
        submitted = request.submitted_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

pub fn confirmation_subject(brand: &str) -> String {
    format!("Sample Request Confirmation - {brand}")
}

/// Customer-facing confirmation with the requested wines and the shipping
/// block, signed off with the brand name.
pub fn render_confirmation(request: &SampleRequest, brand: &str) -> String {
    let wine_items: String = request
        .wines
        .iter()
        .map(|w| format!("    <li>{}</li>\n", escape(&w.name)))
        .collect();

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #2c2c2c;">Sample Request Confirmation</h2>

  <p>Dear {first_name},</p>

  <p>Thank you for your sample request! We have received your order and will be in touch shortly to confirm the details.</p>

  <h3 style="color: #d4a853;">Wines Requested</h3>
  <ul>
{wine_items}  </ul>

  <h3 style="color: #d4a853;">Shipping To</h3>
  {shipping}

  <p>If you have any questions, please don't hesitate to contact us.</p>

  <p>Best regards,<br>
  <strong>{brand}</strong></p>
</div>
"#,
        first_name = escape(&request.contact.first_name),
        wine_items = wine_items,
        shipping = shipping_html(request),
        brand = escape(brand),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_request::{Contact, Shipping};
    use crate::wine::Wine;
    use chrono::{TimeZone, Utc};

    fn request() -> SampleRequest {
        SampleRequest {
            id: "req-1".to_string(),
            contact: Contact {
                company: "Brix & Mortar".to_string(),
                first_name: "Sam".to_string(),
                last_name: "Ortega".to_string(),
                email: "sam@brix.example".to_string(),
                phone: "555-0101".to_string(),
            },
            shipping: Shipping {
                address1: "87 Pearl St".to_string(),
                address2: "Suite 2".to_string(),
                city: "Portland".to_string(),
                state: "OR".to_string(),
                zip: "97201".to_string(),
                country: "USA".to_string(),
            },
            wines: vec![Wine {
                id: "w1".to_string(),
                name: "Château <Test> Rouge".to_string(),
                producer: "Lurton & Sons".to_string(),
                region: "Bordeaux".to_string(),
                range: String::new(),
                color: "Red".to_string(),
                vintage: "2019".to_string(),
            }],
            comments: "Need these before the tasting".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2026, 8, 30, 15, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_internal_notice_contents() {
        let request = request();
        let html = render_internal_notice(&request);
        assert!(html.contains("Brix &amp; Mortar"));
        assert!(html.contains("Sam Ortega"));
        assert!(html.contains("Wines Requested (1)"));
        assert!(html.contains("Lurton &amp; Sons"));
        assert!(html.contains("Need these before the tasting"));
        assert!(html.contains("Suite 2"));
        assert_eq!(
            internal_subject(&request),
            "New Sample Request from Brix & Mortar"
        );
    }

    #[test]
    fn test_confirmation_contents() {
        let request = request();
        let html = render_confirmation(&request, "Loon Trading Co.");
        assert!(html.contains("Dear Sam"));
        assert!(html.contains("Loon Trading Co."));
        assert!(html.contains("Portland, OR 97201"));
        // Producer details stay internal
        assert!(!html.contains("Lurton"));
    }

    #[test]
    fn test_markup_is_escaped() {
        let html = render_internal_notice(&request());
        assert!(html.contains("Château &lt;Test&gt; Rouge"));
        assert!(!html.contains("<Test>"));
    }

    #[test]
    fn test_comments_section_omitted_when_empty() {
        let mut request = request();
        request.comments = String::new();
        let html = render_internal_notice(&request);
        assert!(!html.contains("<h3>Comments</h3>"));
    }
}
