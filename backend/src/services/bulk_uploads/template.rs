use actix_web::{http::header, HttpResponse, Responder};

use common::model::schema::campaign_schema;

const TEMPLATE_FILE_NAME: &str = "campaign_bulk_template.csv";

/// Serves a CSV template with every expected column and one sample row.
pub(crate) async fn process() -> impl Responder {
    match render_template() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{TEMPLATE_FILE_NAME}\""),
            ))
            .body(body),
        Err(e) => HttpResponse::InternalServerError().body(format!("Error: {e}")),
    }
}

fn render_template() -> Result<Vec<u8>, csv::Error> {
    let schema = campaign_schema();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(schema.iter().map(|c| c.key))?;
    writer.write_record(schema.iter().map(|c| c.sample))?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_has_header_and_one_sample_row() {
        let body = render_template().unwrap();
        let text = String::from_utf8(body).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("campaign_name,"));
    }

    #[test]
    fn template_round_trips_through_the_parser() {
        let body = render_template().unwrap();
        let rows = crate::pipeline::parser::parse(&body, TEMPLATE_FILE_NAME).unwrap();
        assert_eq!(rows.len(), 1);

        let records =
            crate::pipeline::validator::validate_rows(&rows, campaign_schema());
        assert!(
            records[0].is_valid,
            "sample row must validate: {:?}",
            records[0].validation_errors
        );
    }
}
