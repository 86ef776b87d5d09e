/// Legacy host of Software Engineering, still printed in old migration events
const LEGACY_PROGRAMMERS_HOST: &str = "programmers.stackexchange.com";
const SOFTWARE_ENGINEERING_HOST: &str = "softwareengineering.stackexchange.com";

/// Turns the site name printed in a migration event into a site URL
///
/// The legacy `programmers.stackexchange.com` alias is rewritten to its
/// current host.
pub fn migration_site_url(site_name: &str) -> String {
    let host = site_name.trim();
    let host = if host == LEGACY_PROGRAMMERS_HOST {
        SOFTWARE_ENGINEERING_HOST
    } else {
        host
    };
    format!("https://{}", host)
}

/// Returns the first path segment made only of digits
///
/// Migration revision links look like `https://superuser.com/posts/1234/revisions`;
/// the first numeric segment is the question id on the source site.
pub fn first_numeric_segment(link: &str) -> Option<i64> {
    link.split('/')
        .find(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .and_then(|part| part.parse().ok())
}
