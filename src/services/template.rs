use crate::errors::ReportError;
use crate::models::ReportData;

/// Seam for the HTML renderer so the assembler stays testable and the
/// document layout swappable. `template_id` picks the document; "email" is
/// the only one shipped.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_id: &str, data: &ReportData) -> Result<String, ReportError>;
}

/// Default renderer: builds the report email inline, one block per ticker
/// with its chart referenced by content id, plus an optional news section.
pub struct EmailTemplate;

impl TemplateRenderer for EmailTemplate {
    fn render(&self, template_id: &str, data: &ReportData) -> Result<String, ReportError> {
        match template_id {
            "email" => Ok(build_report_html(data)),
            other => Err(ReportError::Config(format!("unknown template: {other}"))),
        }
    }
}

fn build_report_html(data: &ReportData) -> String {
    let sections: String = data
        .sections
        .iter()
        .map(|s| {
            // The cid here must equal the chart file name; the email channel
            // attaches each image under exactly that id.
            let chart = s
                .chart_cid
                .as_deref()
                .map(|cid| {
                    format!(
                        r#"<img src="cid:{cid}" alt="{} trend" style="width: 100%; max-width: 560px; border-radius: 4px;"/>"#,
                        s.display_name
                    )
                })
                .unwrap_or_default();

            format!(
                r#"
            <div class="asset">
                <h2>{}</h2>
                <p>{} <span style="color: {}; font-weight: bold;">{}</span></p>
                {}
            </div>"#,
                s.display_name,
                s.headline,
                s.sentiment.color(),
                s.return_text,
                chart
            )
        })
        .collect();

    let news = if data.news.is_empty() {
        String::new()
    } else {
        let items: String = data
            .news
            .iter()
            .map(|n| {
                format!(
                    r#"<li><a href="{}">{}</a> <span class="source">({})</span></li>"#,
                    n.url, n.title, n.source
                )
            })
            .collect();
        format!(
            r#"
            <div class="news">
                <h2>Market news</h2>
                <ul>{items}</ul>
            </div>"#
        )
    };

    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 0; padding: 0; background-color: #f4f4f4; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; background-color: #ffffff; }}
        .header {{ background-color: #212946; color: white; padding: 20px; border-radius: 5px 5px 0 0; }}
        .asset {{ padding: 16px 0; border-bottom: 1px solid #eee; }}
        .news ul {{ padding-left: 18px; }}
        .news .source {{ color: #666; font-size: 12px; }}
        .footer {{ padding: 10px; text-align: center; color: #666; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Market report — {}</h1>
        </div>
        {}
        {}
        <div class="footer">
            <p>Generated automatically by marketbrief.</p>
        </div>
    </div>
</body>
</html>
"#,
        data.date_text(),
        sections,
        news
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sentiment, TickerSection};
    use chrono::NaiveDate;

    fn report() -> ReportData {
        ReportData {
            date: NaiveDate::from_ymd_opt(2024, 9, 12).unwrap(),
            sections: vec![TickerSection {
                symbol: "^GSPC".to_string(),
                display_name: "S&P500".to_string(),
                headline: "The daily return for S&P500 was".to_string(),
                return_text: "-1.98%".to_string(),
                return_pct: -1.98,
                sentiment: Sentiment::NonPositive,
                chart_cid: Some("gspc.png".to_string()),
            }],
            news: vec![],
        }
    }

    #[test]
    fn unknown_template_id_is_rejected() {
        let err = EmailTemplate.render("pdf", &report()).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn html_references_chart_by_content_id() {
        let html = EmailTemplate.render("email", &report()).unwrap();
        assert_eq!(html.matches("cid:gspc.png").count(), 1);
        assert!(html.contains("12/09/2024"));
        assert!(html.contains(r#"color: red"#));
    }

    #[test]
    fn section_without_chart_renders_no_image_tag() {
        let mut data = report();
        data.sections[0].chart_cid = None;
        let html = EmailTemplate.render("email", &data).unwrap();
        assert!(!html.contains("<img"));
        assert!(html.contains("-1.98%"));
    }
}
