//! partydb: maintenance tool for the character server's party file.
//!
//! Loads the party file the same way the server does, runs one command and
//! syncs the file again if the command changed anything.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use partydb_core::backend::SaveHint;
use partydb_core::config::PartyDbConfig;
use partydb_core::party::{MemberSlot, PartyMember, PartyRecord, MAX_PARTY};
use partydb_core::{CharServerDb, PartyDbError, PartyId};

/// Inspect and edit a party text file.
#[derive(Parser, Debug)]
#[command(name = "partydb")]
#[command(about = "Inspect and edit the character server's party file")]
struct Args {
    /// JSON settings file (partyFile, caseSensitive)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Party file to use, overriding the settings file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Match party names case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Start from an empty party file if it does not exist yet
    #[arg(long)]
    create_missing: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all parties
    List,
    /// Show one party with its member slots
    Show { id: PartyId },
    /// Look up a party id by name
    Find { name: String },
    /// Create a party
    Create {
        name: String,
        /// Explicit id instead of the next free one
        #[arg(long)]
        id: Option<PartyId>,
        /// Share experience evenly
        #[arg(long)]
        share_exp: bool,
        /// Item share policy
        #[arg(long, default_value_t = 0)]
        share_item: i32,
        /// Leader as ACCOUNT:CHAR
        #[arg(long, value_parser = parse_member)]
        leader: Option<(u32, u32)>,
        /// Additional member as ACCOUNT:CHAR (repeatable)
        #[arg(long = "member", value_parser = parse_member)]
        members: Vec<(u32, u32)>,
    },
    /// Remove a party
    Remove { id: PartyId },
    /// Rename a party
    Rename { id: PartyId, name: String },
    /// Load the file and report what was read
    Check,
    /// Load the file and write it back
    Compact,
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Create { .. } | Command::Remove { .. } | Command::Rename { .. } | Command::Compact
        )
    }
}

fn parse_member(value: &str) -> Result<(u32, u32), String> {
    let (account, char_id) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ACCOUNT:CHAR, got {value:?}"))?;
    let account = account.parse().map_err(|e| format!("bad account id: {e}"))?;
    let char_id = char_id.parse().map_err(|e| format!("bad char id: {e}"))?;
    Ok((account, char_id))
}

fn load_config(args: &Args) -> Result<PartyDbConfig, String> {
    let mut config = match &args.config {
        Some(path) => PartyDbConfig::load(path).map_err(|e| e.to_string())?,
        None => PartyDbConfig::default(),
    };
    if let Some(file) = &args.file {
        config.party_file = file.clone();
    }
    if args.case_sensitive {
        config.case_sensitive = true;
    }
    Ok(config)
}

fn describe(party: &PartyRecord) -> String {
    format!(
        "{:>6}  {:<24} {:>2}/{}  exp:{} item:{}",
        party.id,
        party.name,
        party.member_count(),
        MAX_PARTY,
        u8::from(party.share_exp),
        party.share_item
    )
}

fn build_party(
    name: String,
    id: Option<PartyId>,
    share_exp: bool,
    share_item: i32,
    leader: Option<(u32, u32)>,
    members: Vec<(u32, u32)>,
) -> Result<PartyRecord, String> {
    let mut party = PartyRecord::new(name);
    if let Some(id) = id {
        party = party.with_id(id);
    }
    party.share_exp = share_exp;
    party.share_item = share_item;

    let occupants = leader
        .map(|(a, c)| PartyMember::leader(a, c))
        .into_iter()
        .chain(members.into_iter().map(|(a, c)| PartyMember::new(a, c)));
    for member in occupants {
        let slot = party
            .first_free_slot()
            .ok_or_else(|| format!("a party holds at most {MAX_PARTY} members"))?;
        party.members[slot] = MemberSlot::Occupied(member);
    }

    Ok(party)
}

/// Write an empty party file (and its directory) if there is none yet.
///
/// Returns whether a file was created.
fn ensure_party_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    }
    fs::write(path, "").map_err(|e| e.to_string())?;
    log::info!("Created empty party file {}", path.display());
    Ok(true)
}

fn run(args: Args) -> Result<(), String> {
    let config = load_config(&args)?;

    if args.create_missing {
        ensure_party_file(&config.party_file)?;
    }

    let mut server = CharServerDb::builder().config(config).build();
    server.init().map_err(|e| e.to_string())?;

    let mutates = args.command.mutates();
    match args.command {
        Command::List => {
            for party in server.parties().iter() {
                println!("{}", describe(&party));
            }
        }
        Command::Show { id } => {
            let party = server
                .parties()
                .load(id)
                .ok_or_else(|| PartyDbError::NotFound(id).to_string())?;
            println!("{}", describe(&party));
            for (slot, member) in party.members.iter().enumerate() {
                if let MemberSlot::Occupied(m) = member {
                    let role = if m.leader { " (leader)" } else { "" };
                    println!("  [{slot:>2}] account {} char {}{role}", m.account_id, m.char_id);
                }
            }
        }
        Command::Find { name } => match server.parties().name_to_id(&name) {
            Some(id) => println!("{id}"),
            None => return Err(format!("No party named {name:?}")),
        },
        Command::Create {
            name,
            id,
            share_exp,
            share_item,
            leader,
            members,
        } => {
            let mut party = build_party(name, id, share_exp, share_item, leader, members)?;
            let id = server
                .parties_mut()
                .create(&mut party)
                .map_err(|e| e.to_string())?;
            println!("{id}");
        }
        Command::Remove { id } => {
            server.parties_mut().remove(id).map_err(|e| e.to_string())?;
        }
        Command::Rename { id, name } => {
            let mut party = server
                .parties()
                .load(id)
                .ok_or_else(|| PartyDbError::NotFound(id).to_string())?;
            party.name = name;
            server
                .parties_mut()
                .save(&party, SaveHint::Basic)
                .map_err(|e| e.to_string())?;
        }
        Command::Check => {
            println!("{} parties", server.parties().iter().count());
        }
        Command::Compact => server.sync_signal().request_again(),
    }

    if mutates {
        server.flush_if_requested().map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_create_with_members() {
        let args = Args::try_parse_from([
            "partydb",
            "--file",
            "party.txt",
            "create",
            "Alpha",
            "--leader",
            "2000001:150000",
            "--member",
            "2000002:150001",
            "--share-exp",
        ])
        .unwrap();

        assert_eq!(args.file, Some(PathBuf::from("party.txt")));
        match args.command {
            Command::Create {
                name,
                leader,
                members,
                share_exp,
                ..
            } => {
                assert_eq!(name, "Alpha");
                assert_eq!(leader, Some((2000001, 150000)));
                assert_eq!(members, vec![(2000002, 150001)]);
                assert!(share_exp);
            }
            other => panic!("Expected Create, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_member_spec() {
        assert!(parse_member("2000001").is_err());
        assert!(parse_member("x:1").is_err());
        assert_eq!(parse_member("1:2"), Ok((1, 2)));
    }

    #[test]
    fn build_party_fills_slots_in_order() {
        let party = build_party(
            "Alpha".to_string(),
            Some(4),
            true,
            1,
            Some((1, 10)),
            vec![(2, 20), (3, 30)],
        )
        .unwrap();

        assert_eq!(party.id, 4);
        assert_eq!(party.leader().map(|(slot, _)| slot), Some(0));
        assert_eq!(party.find_member(3, 30), Some(2));
        assert_eq!(party.member_count(), 3);
    }

    #[test]
    fn build_party_refuses_too_many_members() {
        let members = (1..=MAX_PARTY as u32).map(|i| (i, i)).collect();
        assert!(build_party("Full".to_string(), None, false, 0, Some((99, 99)), members).is_err());
    }

    #[test]
    fn only_editing_commands_mutate() {
        assert!(Command::Compact.mutates());
        assert!(Command::Remove { id: 1 }.mutates());
        assert!(!Command::List.mutates());
        assert!(!Command::Check.mutates());
    }

    #[test]
    fn create_missing_starts_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save").join("party.txt");
        let file = path.to_str().unwrap();

        let args = Args::try_parse_from(["partydb", "--file", file, "check"]).unwrap();
        assert!(!args.create_missing);
        assert!(run(args).is_err());
        assert!(!path.exists());

        let args =
            Args::try_parse_from(["partydb", "--file", file, "--create-missing", "create", "Alpha"])
                .unwrap();
        run(args).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("1\tAlpha\t"));

        // An existing file is left alone
        assert!(!ensure_party_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn file_flag_overrides_config() {
        let args = Args::try_parse_from(["partydb", "--file", "other.txt", "--case-sensitive", "list"])
            .unwrap();
        let config = load_config(&args).unwrap();

        assert_eq!(config.party_file, PathBuf::from("other.txt"));
        assert!(config.case_sensitive);
    }
}
