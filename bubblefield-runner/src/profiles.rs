use crate::RunnerError;
use bubblefield_core::{dedupe_profiles, Profile, ProfileFeed};
use crossbeam_channel::{bounded, Receiver};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Accepted profile file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileDocument {
    Wrapped { avatars: Vec<Profile> },
    List(Vec<Profile>),
}

/// Parses a profile list, keeping the first profile for each image URL.
pub fn parse_profiles(content: &str) -> Result<Vec<Profile>, serde_json::Error> {
    let profiles = match serde_json::from_str(content)? {
        ProfileDocument::Wrapped { avatars } => avatars,
        ProfileDocument::List(list) => list,
    };
    Ok(dedupe_profiles(profiles))
}

pub fn load_profiles(path: &Path) -> Result<Vec<Profile>, RunnerError> {
    let content = fs::read_to_string(path).map_err(|source| RunnerError::ProfileRead {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_profiles(&content)?)
}

/// Stands in for the remote profile service: delivers one [`ProfileFeed`] after `delay`.
///
/// Without a file the feed is an empty list, which runs the field without avatars.
pub fn spawn_profile_source(
    path: Option<PathBuf>,
    delay: Duration,
) -> Result<Receiver<ProfileFeed>, RunnerError> {
    let (tx, rx) = bounded(1);

    let Some(path) = path else {
        // the receiver is still alive here
        let _ = tx.send(ProfileFeed::Ready(Vec::new()));
        return Ok(rx);
    };

    thread::Builder::new()
        .name("profile-source".to_string())
        .spawn(move || {
            thread::sleep(delay);
            let feed = match load_profiles(&path) {
                Ok(profiles) => ProfileFeed::Ready(profiles),
                Err(e) => ProfileFeed::Failed(e.to_string()),
            };
            if tx.send(feed).is_err() {
                debug!("Profile feed dropped: runner already stopped");
            }
        })?;

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_wrapped_and_bare_lists() {
        let wrapped = r#"{ "avatars": [
            { "name": "Ada", "image": "https://img/ada" },
            { "image": "https://img/anon" },
            { "name": "Ada again", "image": "https://img/ada" }
        ] }"#;
        let profiles = parse_profiles(wrapped).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[1].name, "User");

        let bare = r#"[{ "name": "Grace", "image_url": "grace.png" }]"#;
        assert_eq!(
            parse_profiles(bare).unwrap(),
            vec![Profile::new("Grace", "grace.png")]
        );

        assert!(parse_profiles(r#"{ "users": [] }"#).is_err());
    }

    #[test]
    fn source_delivers_file_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "name": "Ada", "image": "ada.png" }}]"#).unwrap();

        let rx = spawn_profile_source(Some(file.path().to_path_buf()), Duration::ZERO).unwrap();
        let feed = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(feed.profiles(), &[Profile::new("Ada", "ada.png")]);
    }

    #[test]
    fn missing_file_is_a_failed_feed() {
        let rx = spawn_profile_source(
            Some(PathBuf::from("/definitely/not/here/profiles.json")),
            Duration::ZERO,
        )
        .unwrap();
        let feed = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(feed.error().is_some());
    }

    #[test]
    fn no_file_means_no_avatars() {
        let rx = spawn_profile_source(None, Duration::from_secs(60)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ProfileFeed::Ready(Vec::new()));
    }
}
