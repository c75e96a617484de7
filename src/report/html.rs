//! HTML dashboard page with a Plotly choropleth
//!
//! One template serves both the static report and the live UI of
//! `varredor serve`. In live mode the page shows filter controls and fetches
//! fresh dashboards from the server; in static mode it renders the embedded
//! data only.

use crate::dashboard::{Dashboard, FilterOptions};
use crate::error::Result;
use std::io::Write;

const TEMPLATE: &str = include_str!("dashboard.html");

pub const TITLE: &str = "Varredor Progressivo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Static,
    Live,
}

pub fn write<W: Write>(writer: &mut W, dashboard: &Dashboard) -> Result<()> {
    let options = FilterOptions::default();
    let html = render(dashboard, &options, Mode::Static)?;
    writer.write_all(html.as_bytes())?;
    Ok(())
}

/// Fill the template with the dashboard and filter choices
pub fn render(dashboard: &Dashboard, options: &FilterOptions, mode: Mode) -> Result<String> {
    let data = script_json(&serde_json::to_string(dashboard)?);
    let options = script_json(&serde_json::to_string(options)?);
    let live = match mode {
        Mode::Live => "true",
        Mode::Static => "false",
    };

    Ok(TEMPLATE
        .replace("{{TITLE}}", TITLE)
        .replace("{{LIVE}}", live)
        .replace("{{OPTIONS}}", &options)
        .replace("{{DATA}}", &data))
}

/// Make JSON safe to inline in a `<script>` element
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::dashboard::DEFAULT_TOP;
    use crate::filter::Filter;
    use crate::rating::RatingConfig;

    fn catalog(artist: &str) -> Catalog {
        Catalog::from_rows(
            vec!["artist_name".into(), "country".into(), "rating".into(), "num_ratings".into()],
            vec![vec![artist.into(), "Italy".into(), "4.1".into(), "10".into()]],
            &RatingConfig::default(),
        )
    }

    #[test]
    fn test_template_has_placeholders() {
        for p in ["{{TITLE}}", "{{LIVE}}", "{{OPTIONS}}", "{{DATA}}"] {
            assert!(TEMPLATE.contains(p), "template lacks {}", p);
        }
    }

    #[test]
    fn test_template_has_sections() {
        assert!(TEMPLATE.contains("id=\"country-map\""));
        assert!(TEMPLATE.contains("id=\"albums-table\""));
        assert!(TEMPLATE.contains("function renderDashboard(data)"));
        assert!(TEMPLATE.contains("renderDashboard(INITIAL);"));
    }

    #[test]
    fn test_render_fills_everything() {
        let cat = catalog("Osanna");
        let dash = Dashboard::build(&cat, &Filter::new(), DEFAULT_TOP);
        let html = render(&dash, &FilterOptions::from_albums(&cat.albums), Mode::Live).unwrap();

        assert!(!html.contains("{{"), "unfilled placeholder");
        assert!(html.contains("const LIVE = true;"));
        assert!(html.contains("\"Osanna\""));
        assert!(html.contains("\"countries\":[\"Italy\"]"));
    }

    #[test]
    fn test_static_mode() {
        let cat = catalog("Osanna");
        let dash = Dashboard::build(&cat, &Filter::new(), DEFAULT_TOP);
        let mut buf = Vec::new();
        write(&mut buf, &dash).unwrap();
        let html = String::from_utf8(buf).unwrap();

        assert!(html.contains("const LIVE = false;"));
    }

    #[test]
    fn test_script_breakout_is_escaped() {
        let cat = catalog("</script><script>alert(1)</script>");
        let dash = Dashboard::build(&cat, &Filter::new(), DEFAULT_TOP);
        let html = render(&dash, &FilterOptions::default(), Mode::Static).unwrap();

        assert!(!html.contains("</script><script>alert"));
        assert!(html.contains("<\\/script><script>alert(1)<\\/script>"));
    }
}
