//! Robots.txt parser implementation
//!
//! Only `User-agent` and `Disallow` lines are interpreted. `Allow`,
//! `Crawl-delay` and `Sitemap` are read past without effect, and matching is a
//! plain path-prefix test.

use std::collections::HashMap;

/// Parsed robots.txt rules for one domain
///
/// Maps each user-agent token (lowercase, `*` for the wildcard group) to the
/// path prefixes it is disallowed from fetching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    disallow: HashMap<String, Vec<String>>,
}

impl RobotsRules {
    /// Creates a permissive rule set that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses raw robots.txt content
    ///
    /// Consecutive `User-agent` lines form one group; the group ends at the
    /// first non-`User-agent` directive. Disallow prefixes are stored
    /// lowercase because crawl URLs are lowercased by normalization.
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// The parsed rule set
    pub fn parse(content: &str) -> Self {
        let mut disallow: HashMap<String, Vec<String>> = HashMap::new();
        let mut group_agents: Vec<String> = Vec::new();
        let mut group_has_rules = false;

        for line in content.lines() {
            // Strip comments
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if group_has_rules {
                        group_agents.clear();
                        group_has_rules = false;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "disallow" => {
                    group_has_rules = true;
                    // An empty Disallow allows everything
                    if value.is_empty() {
                        continue;
                    }
                    for agent in &group_agents {
                        disallow
                            .entry(agent.clone())
                            .or_default()
                            .push(value.to_lowercase());
                    }
                }
                _ => {
                    if !group_agents.is_empty() {
                        group_has_rules = true;
                    }
                }
            }
        }

        Self { disallow }
    }

    /// Checks if a path may be fetched by the given agent
    ///
    /// The `*` group and the group named by `agent_token` are merged; the
    /// path is disallowed if it starts with any of their prefixes.
    ///
    /// # Arguments
    ///
    /// * `path` - The URL path to check, e.g. "/wiki/rust"
    /// * `agent_token` - Lowercase product token of our user agent
    ///
    /// # Returns
    ///
    /// * `true` - If the path is allowed
    /// * `false` - If the path is disallowed
    pub fn is_allowed(&self, path: &str, agent_token: &str) -> bool {
        let path = if path.is_empty() { "/" } else { path };
        !self
            .prefixes_for(agent_token)
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Returns true if the rules contain no disallow prefixes at all
    pub fn is_empty(&self) -> bool {
        self.disallow.values().all(Vec::is_empty)
    }

    fn prefixes_for<'a>(&'a self, agent_token: &'a str) -> impl Iterator<Item = &'a String> {
        self.disallow
            .iter()
            .filter(move |(agent, _)| agent.as_str() == "*" || agent.as_str() == agent_token)
            .flat_map(|(_, prefixes)| prefixes.iter())
    }
}

/// Derives the robots.txt agent token from a full user-agent string
///
/// The token is the lowercase product name before the first `/` or space,
/// e.g. `CorpusCrawler/1.0 (+https://...)` becomes `corpuscrawler`.
pub fn agent_token(user_agent: &str) -> String {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = RobotsRules::allow_all();
        assert!(robots.is_allowed("/anything", "bot"));
        assert!(robots.is_empty());
    }

    #[test]
    fn test_wildcard_disallow() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /private\n");
        assert!(!robots.is_allowed("/private/page", "bot"));
        assert!(!robots.is_allowed("/private", "bot"));
        assert!(robots.is_allowed("/public", "bot"));
    }

    #[test]
    fn test_disallow_root_blocks_everything() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /\n");
        assert!(!robots.is_allowed("/", "bot"));
        assert!(!robots.is_allowed("/wiki/rust", "bot"));
        assert!(!robots.is_allowed("", "bot"));
    }

    #[test]
    fn test_empty_disallow_allows() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow:\n");
        assert!(robots.is_allowed("/anything", "bot"));
    }

    #[test]
    fn test_agent_specific_group_merges_with_wildcard() {
        let content = "\
User-agent: *
Disallow: /tmp

User-agent: CorpusCrawler
Disallow: /search
";
        let robots = RobotsRules::parse(content);
        assert!(!robots.is_allowed("/search?q=1", "corpuscrawler"));
        assert!(!robots.is_allowed("/tmp/x", "corpuscrawler"));
        assert!(robots.is_allowed("/search?q=1", "otherbot"));
    }

    #[test]
    fn test_consecutive_user_agents_share_group() {
        let content = "\
User-agent: a
User-agent: b
Disallow: /x
User-agent: c
Disallow: /y
";
        let robots = RobotsRules::parse(content);
        assert!(!robots.is_allowed("/x", "a"));
        assert!(!robots.is_allowed("/x", "b"));
        assert!(robots.is_allowed("/x", "c"));
        assert!(!robots.is_allowed("/y", "c"));
        assert!(robots.is_allowed("/y", "a"));
    }

    #[test]
    fn test_allow_and_crawl_delay_are_ignored() {
        let content = "\
User-agent: *
Crawl-delay: 10
Allow: /private/open
Disallow: /private
";
        let robots = RobotsRules::parse(content);
        assert!(!robots.is_allowed("/private/open", "bot"));
    }

    #[test]
    fn test_comments_and_case() {
        let content = "# comment\nUSER-AGENT: * # all\nDISALLOW: /Admin # admin area\n";
        let robots = RobotsRules::parse(content);
        assert!(!robots.is_allowed("/admin/panel", "bot"));
    }

    #[test]
    fn test_agent_token() {
        assert_eq!(
            agent_token("CorpusCrawler/1.0 (+https://example.org/bot)"),
            "corpuscrawler"
        );
        assert_eq!(agent_token("SimpleBot"), "simplebot");
        assert_eq!(agent_token(""), "");
    }
}
