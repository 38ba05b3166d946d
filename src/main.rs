//! grit CLI - the stupid content tracker, content-addressed at git's level

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use grit::ops::{add, add_all, checkout, commit, log_edges, ls_tree, tag_create, tag_list, write_tree};
use grit::{
    find_object, flatten_refs, hash_object, list_refs, object_kind, read_index, read_object,
    Object, ObjectKind, Repository,
};

#[derive(Parser)]
#[command(name = "grit")]
#[command(about = "git-compatible content-addressed revision store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new, empty repository
    Init {
        /// where to create the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// compute object id and optionally write a blob from a file
    HashObject {
        /// object kind to hash as
        #[arg(short = 't', default_value = "blob")]
        kind: String,

        /// actually write the object into the database
        #[arg(short = 'w')]
        write: bool,

        /// read the object from this file
        path: PathBuf,
    },

    /// show type or contents of a repository object
    CatFile {
        /// show the object type instead of its content
        #[arg(short = 't')]
        show_type: bool,

        /// pretty-print the object content
        #[arg(short = 'p')]
        pretty: bool,

        /// expected kind, or the object when no second argument follows
        #[arg(value_name = "KIND|OBJECT")]
        first: String,

        /// the object to display
        #[arg(value_name = "OBJECT")]
        second: Option<String>,
    },

    /// display history of a commit as a graphviz digraph
    Log {
        /// commit to start at
        #[arg(default_value = "HEAD")]
        commit: String,
    },

    /// pretty-print a tree object
    LsTree {
        /// the tree-ish to show
        tree: String,
    },

    /// materialize a commit or tree inside an empty directory
    Checkout {
        /// the commit or tree to check out
        commit: String,

        /// the EMPTY directory to check out into
        path: PathBuf,
    },

    /// list references
    ShowRef,

    /// list tags, or create a lightweight or annotated tag
    Tag {
        /// create a tag object instead of a plain ref
        #[arg(short = 'a')]
        annotate: bool,

        /// message for the tag object
        #[arg(short = 'm', default_value = "")]
        message: String,

        /// the new tag's name; absent lists existing tags
        name: Option<String>,

        /// the object the new tag points at
        #[arg(default_value = "HEAD")]
        object: String,
    },

    /// resolve a name to an object hash
    RevParse {
        /// expected object kind, followed through tags and commits
        #[arg(long = "type", value_name = "KIND")]
        kind: Option<String>,

        /// the name to parse
        name: String,
    },

    /// add file contents to the index
    Add {
        /// stage everything under the worktree
        #[arg(short = 'A', long = "all")]
        all: bool,

        /// worktree-relative paths to stage
        paths: Vec<PathBuf>,
    },

    /// hash the current index as a flat tree
    WriteTree,

    /// show staged entries
    LsFiles {
        /// show staged entries with mode, hash and stage
        #[arg(short = 's')]
        stage: bool,
    },

    /// record the staged tree as a commit on the current branch
    Commit {
        author: String,
        committer: String,
        message: String,
    },

    /// register file contents in the index
    UpdateIndex {
        /// add the given paths
        #[arg(long)]
        add: bool,

        paths: Vec<PathBuf>,
    },

    /// manage the set of tracked repositories
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
}

#[derive(Subcommand)]
enum RemoteCommands {
    /// add a remote
    Add { name: String, url: String },
    /// remove a remote
    Remove { name: String },
    /// rename a remote
    Rename { old: String, new: String },
    /// print the url of a remote
    GetUrl { name: String },
    /// list remotes
    List,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn open_repo() -> grit::Result<Repository> {
    let cwd = std::env::current_dir().map_err(|source| grit::Error::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Repository::find(&cwd)
}

fn run(cli: Cli) -> grit::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            Repository::init(&path)?;
            println!("initialized empty grit repository at {}", path.display());
        }

        Commands::HashObject { kind, write, path } => {
            let kind: ObjectKind = kind.parse()?;
            let data = std::fs::read(&path).map_err(|source| grit::Error::Io {
                path: path.clone(),
                source,
            })?;
            let object = Object::parse(kind, data)?;

            let id = if write {
                let repo = open_repo()?;
                grit::write_object(&repo, &object)?
            } else {
                hash_object(kind, &object.serialize())
            };
            println!("{}", id);
        }

        Commands::CatFile {
            show_type,
            pretty: _,
            first,
            second,
        } => {
            let repo = open_repo()?;
            let (kind, name) = match &second {
                Some(object) => (Some(first.parse::<ObjectKind>()?), object.as_str()),
                None => (None, first.as_str()),
            };

            let id = find_object(&repo, name, kind, true)?;
            if show_type {
                println!("{}", object_kind(&repo, &id)?);
            } else {
                cat_object(&repo, &id)?;
            }
        }

        Commands::Log { commit } => {
            let repo = open_repo()?;
            let start = find_object(&repo, &commit, Some(ObjectKind::Commit), true)?;

            println!("digraph gritlog{{");
            for edge in log_edges(&repo, start)? {
                println!("{}", edge);
            }
            println!("}}");
        }

        Commands::LsTree { tree } => {
            let repo = open_repo()?;
            for entry in ls_tree(&repo, &tree)? {
                println!("{}", entry);
            }
        }

        Commands::Checkout { commit, path } => {
            let repo = open_repo()?;
            checkout(&repo, &commit, &path)?;
            println!("checked out {} to {}", commit, path.display());
        }

        Commands::ShowRef => {
            let repo = open_repo()?;
            let map = list_refs(&repo, None)?;
            for (name, id) in flatten_refs(&map, "refs") {
                println!("{} {}", id, name);
            }
        }

        Commands::Tag {
            annotate,
            message,
            name,
            object,
        } => {
            let repo = open_repo()?;
            match name {
                Some(name) => {
                    let tagger = tagger_identity(&repo);
                    tag_create(&repo, &name, &object, annotate, &tagger, &message)?;
                }
                None => {
                    for tag in tag_list(&repo)? {
                        println!("{}", tag);
                    }
                }
            }
        }

        Commands::RevParse { kind, name } => {
            let repo = open_repo()?;
            let kind = kind.map(|k| k.parse::<ObjectKind>()).transpose()?;
            println!("{}", find_object(&repo, &name, kind, true)?);
        }

        Commands::Add { all, paths } => {
            let repo = open_repo()?;
            if all {
                add_all(&repo)?;
            } else {
                add(&repo, &paths)?;
            }
        }

        Commands::WriteTree => {
            let repo = open_repo()?;
            println!("{}", write_tree(&repo)?);
        }

        Commands::LsFiles { stage } => {
            let repo = open_repo()?;
            for entry in read_index(&repo)? {
                if stage {
                    println!(
                        "{:o} {} {}\t{}",
                        entry.mode,
                        entry.id,
                        entry.stage(),
                        entry.path
                    );
                } else {
                    println!("{}", entry.path);
                }
            }
        }

        Commands::Commit {
            author,
            committer,
            message,
        } => {
            let repo = open_repo()?;
            println!("{}", commit(&repo, &author, &committer, &message)?);
        }

        Commands::UpdateIndex { add: do_add, paths } => {
            if do_add {
                let repo = open_repo()?;
                add(&repo, &paths)?;
            }
        }

        Commands::Remote { command } => {
            let mut repo = open_repo()?;
            match command {
                RemoteCommands::Add { name, url } => {
                    repo.config_mut().add_remote(&name, &url)?;
                    repo.save_config()?;
                }
                RemoteCommands::Remove { name } => {
                    repo.config_mut().remove_remote(&name)?;
                    repo.save_config()?;
                }
                RemoteCommands::Rename { old, new } => {
                    repo.config_mut().rename_remote(&old, &new)?;
                    repo.save_config()?;
                }
                RemoteCommands::GetUrl { name } => {
                    println!("{}", repo.config().remote_url(&name)?);
                }
                RemoteCommands::List => {
                    for (name, url) in repo.config().remotes() {
                        println!("{}\t{}", name, url);
                    }
                }
            }
        }
    }

    Ok(())
}

/// print an object the way `cat-file -p` does
fn cat_object(repo: &Repository, id: &grit::ObjectId) -> grit::Result<()> {
    match read_object(repo, id)? {
        Object::Blob(data) => {
            io::stdout()
                .write_all(&data)
                .map_err(|source| grit::Error::Io {
                    path: PathBuf::from("stdout"),
                    source,
                })?;
        }
        Object::Commit(commit) => print_bytes(&commit.serialize())?,
        Object::Tag(tag) => print_bytes(&tag.serialize())?,
        Object::Tree(_) => {
            for entry in ls_tree(repo, &id.to_hex())? {
                println!("{}", entry);
            }
        }
    }
    Ok(())
}

fn print_bytes(data: &[u8]) -> grit::Result<()> {
    io::stdout()
        .write_all(data)
        .map_err(|source| grit::Error::Io {
            path: PathBuf::from("stdout"),
            source,
        })
}

/// tagger identity from user.name/user.email config, with a fallback
fn tagger_identity(repo: &Repository) -> String {
    let name = repo
        .config()
        .get("user", "name")
        .unwrap_or_else(|| "anonymous".to_string());
    let email = repo
        .config()
        .get("user", "email")
        .unwrap_or_else(|| "anonymous@localhost".to_string());
    format!("{} <{}>", name, email)
}
