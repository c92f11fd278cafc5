use anyhow::Result;

use crate::registry::ActionContext;

/// A query-taking action. Doubles as the pending-clarification marker: when
/// the user says a bare "search" or "play", the resolver stashes the variant
/// and treats the next utterance as its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    SearchGoogle,
    SearchYouTube,
    PlayMusic,
    SearchSpotify,
    /// Same Spotify search page as `SearchSpotify`, but phrased as playback
    /// because the user said "play", not "search".
    PlaySpotify,
    SearchReddit,
    SearchGithub,
}

impl PendingAction {
    /// The clarifying question spoken when the query is missing.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::SearchGoogle => "What would you like me to search for, sir?",
            Self::SearchYouTube => "What should I look up on YouTube, sir?",
            Self::PlayMusic => "What would you like me to play, sir?",
            Self::SearchSpotify => "What should I search on Spotify, sir?",
            Self::PlaySpotify => "What would you like me to play on Spotify, sir?",
            Self::SearchReddit => "What should I search on Reddit, sir?",
            Self::SearchGithub => "What should I search on GitHub, sir?",
        }
    }

    /// Stable action name reported in command results.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SearchGoogle => "search-google",
            Self::SearchYouTube => "search-youtube",
            Self::PlayMusic => "play-music",
            Self::SearchSpotify => "search-spotify",
            Self::PlaySpotify => "play-spotify",
            Self::SearchReddit => "search-reddit",
            Self::SearchGithub => "search-github",
        }
    }

    fn url(&self, query: &str) -> String {
        match self {
            Self::SearchGoogle => {
                format!("https://www.google.com/search?q={}", query_encode(query))
            }
            Self::SearchYouTube | Self::PlayMusic => format!(
                "https://www.youtube.com/results?search_query={}",
                query_encode(query)
            ),
            Self::SearchSpotify | Self::PlaySpotify => {
                format!("https://open.spotify.com/search/{}", path_encode(query))
            }
            Self::SearchReddit => {
                format!("https://www.reddit.com/search/?q={}", query_encode(query))
            }
            Self::SearchGithub => {
                format!("https://github.com/search?q={}", query_encode(query))
            }
        }
    }

    fn spoken(&self, query: &str) -> String {
        match self {
            Self::SearchGoogle => format!("Searching Google for {query}, sir."),
            Self::SearchYouTube => format!("Searching YouTube for {query}, sir."),
            Self::PlayMusic => format!("Playing {query}, sir."),
            Self::SearchSpotify => format!("Searching Spotify for {query}, sir."),
            Self::PlaySpotify => format!("Playing {query} on Spotify, sir."),
            Self::SearchReddit => format!("Searching Reddit for {query}, sir."),
            Self::SearchGithub => format!("Searching GitHub for {query}, sir."),
        }
    }

    /// Speak the confirmation and open the destination for `query`.
    pub fn run(&self, query: &str, ctx: &ActionContext) -> Result<()> {
        ctx.speech.say(&self.spoken(query));
        ctx.automation.open_url(&self.url(query))
    }
}

/// A fully parsed parameterized command, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterizedCommand {
    Single {
        action: PendingAction,
        query: String,
    },
    /// "search A and play B": a Google search immediately, then a YouTube
    /// play after a short pause.
    Compound {
        search: String,
        play: String,
    },
}

impl ParameterizedCommand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Single { action, .. } => action.label(),
            Self::Compound { .. } => "search-and-play",
        }
    }

    pub fn run(&self, ctx: &ActionContext) -> Result<()> {
        match self {
            Self::Single { action, query } => action.run(query, ctx),
            Self::Compound { search, play } => {
                ctx.speech
                    .say(&format!("Searching for {search} and queueing {play}, sir."));
                ctx.automation
                    .open_url(&PendingAction::SearchGoogle.url(search))?;

                // The play half runs off the request path so the pause does
                // not hold the resolver lock. Its failure can only be logged.
                let automation = ctx.automation.clone();
                let play_url = PendingAction::PlayMusic.url(play);
                let delay = ctx.compound_delay;
                ctx.spawner.spawn(Box::new(move || {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    if let Err(e) = automation.open_url(&play_url) {
                        tracing::error!(error = %e, "compound play step failed");
                    }
                }));
                Ok(())
            }
        }
    }
}

/// Outcome of a parse attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Resolved(ParameterizedCommand),
    /// A query-taking verb with no query; the resolver should ask and wait.
    NeedsArgument(PendingAction),
    NoMatch,
}

/// Parse `command` against the parameterized shapes, most specific first.
///
/// The input is already trimmed and lower-cased. Shapes are plain prefix and
/// suffix matches; anything that falls through here gets a chance at the
/// fixed keyword table next.
pub fn parse(command: &str) -> Parsed {
    use PendingAction::*;

    // Bare query-taking verbs: exact matches only, so they cannot shadow
    // the prefixed shapes below.
    match command {
        "search" | "search for" | "google" => return Parsed::NeedsArgument(SearchGoogle),
        "youtube search" | "look up" => return Parsed::NeedsArgument(SearchYouTube),
        "play" | "play music" | "play song" | "play a song" => {
            return Parsed::NeedsArgument(PlayMusic)
        }
        _ => {}
    }

    // Compound: "search A and play B" / "search A then play B".
    if let Some(rest) = command.strip_prefix("search ") {
        let rest = rest.strip_prefix("for ").unwrap_or(rest);
        for sep in ["and play", "then play"] {
            // Trailing "… and play" with no B: replay the search terms.
            if let Some(search) = rest.strip_suffix(&format!(" {sep}")) {
                let search = search.trim();
                if !search.is_empty() {
                    return Parsed::Resolved(ParameterizedCommand::Compound {
                        search: search.to_string(),
                        play: search.to_string(),
                    });
                }
            }
            if let Some(idx) = rest.find(&format!(" {sep} ")) {
                let search = rest[..idx].trim();
                let play = strip_play_fillers(&rest[idx + sep.len() + 2..]);
                if !search.is_empty() {
                    let play = if play.is_empty() {
                        search.to_string()
                    } else {
                        play
                    };
                    return Parsed::Resolved(ParameterizedCommand::Compound {
                        search: search.to_string(),
                        play,
                    });
                }
            }
        }
    }

    // "play X on spotify" / "play X on youtube".
    if let Some(rest) = command.strip_prefix("play ") {
        if let Some(q) = rest.strip_suffix(" on spotify") {
            return single_or_ask(PlaySpotify, strip_play_prefix(q));
        }
        // Playing on YouTube is the play action, not a search; same results
        // page, but the spoken line says "Playing", not "Searching".
        if let Some(q) = rest.strip_suffix(" on youtube") {
            return single_or_ask(PlayMusic, strip_play_prefix(q));
        }
    }

    // "search [for] X on <destination>", then plain "search [for] X".
    if let Some(rest) = command.strip_prefix("search ") {
        let rest = rest.strip_prefix("for ").unwrap_or(rest);
        for (suffix, action) in [
            (" on youtube", SearchYouTube),
            (" on spotify", SearchSpotify),
            (" on reddit", SearchReddit),
            (" on github", SearchGithub),
            (" on google", SearchGoogle),
        ] {
            if let Some(q) = rest.strip_suffix(suffix) {
                return single_or_ask(action, q);
            }
        }
        return single_or_ask(SearchGoogle, rest);
    }

    if let Some(q) = command.strip_prefix("youtube search ") {
        return single_or_ask(SearchYouTube, q);
    }

    if let Some(q) = command.strip_prefix("look up ") {
        return single_or_ask(SearchYouTube, q);
    }

    if let Some(q) = command.strip_prefix("google ") {
        return single_or_ask(SearchGoogle, q);
    }

    if let Some(rest) = command.strip_prefix("play ") {
        return single_or_ask(PlayMusic, strip_play_prefix(rest));
    }

    Parsed::NoMatch
}

fn single_or_ask(action: PendingAction, query: &str) -> Parsed {
    let query = query.trim();
    if query.is_empty() {
        Parsed::NeedsArgument(action)
    } else {
        Parsed::Resolved(ParameterizedCommand::Single {
            action,
            query: query.to_string(),
        })
    }
}

/// Drops a single leading filler from a play query: "play the song X",
/// "play music X", "play a song X" all reduce to X.
fn strip_play_prefix(query: &str) -> &str {
    for prefix in ["the song ", "a song ", "music ", "song "] {
        if let Some(rest) = query.strip_prefix(prefix) {
            return rest;
        }
    }
    query
}

/// Drops any run of leading filler words from the compound play half:
/// "the music despacito" reduces to "despacito", a pure-filler half reduces
/// to nothing (and the caller falls back to the search terms).
fn strip_play_fillers(half: &str) -> String {
    let mut words: Vec<&str> = half.split_whitespace().collect();
    while let Some(first) = words.first() {
        if matches!(*first, "the" | "music" | "song" | "a") {
            words.remove(0);
        } else {
            break;
        }
    }
    words.join(" ")
}

fn query_encode(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

fn path_encode(query: &str) -> String {
    // Path segment, not a query string: spaces must be %20, not '+'.
    query_encode(query).replace('+', "%20")
}
