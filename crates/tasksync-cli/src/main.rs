mod config;

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tasksync_core::domain::{Session, User};
use tasksync_core::impls::{InMemorySessionProvider, InMemoryTaskStore, RestTaskStore};
use tasksync_core::ports::TaskStore;
use tasksync_core::{
    App, NewTask, ScreenStack, Task, TaskFilter, TaskId, TaskPatch, TaskStatus, TaskSync,
    TaskSyncBuilder, UserId,
};

use crate::config::{BackendKind, CliArgs, CliConfig, Command};

/// ログは stderr に出す（stdout はコマンドの出力用）
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_task(task: &Task) {
    let deadline = task
        .deadline
        .map(|d| format!("  due {d}"))
        .unwrap_or_default();
    println!("{}  [{}]  {}{}", task.id, task.status, task.title, deadline);
    if let Some(description) = &task.description {
        println!("    {description}");
    }
}

fn print_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("(no tasks)");
    }
    for task in tasks {
        print_task(task);
    }
}

fn wire(config: &CliConfig, session: Arc<InMemorySessionProvider>) -> anyhow::Result<App> {
    let store: Arc<dyn TaskStore> = match config.backend {
        BackendKind::Memory => Arc::new(InMemoryTaskStore::new()),
        BackendKind::Rest => Arc::new(RestTaskStore::new(config.rest()?, session.clone())?),
    };
    Ok(TaskSyncBuilder::new().store(store).session(session).build()?)
}

async fn run_command(tasks: &TaskSync, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List { filter } => {
            tasks.set_filter(filter);
            print_list(&tasks.filtered_view());
        }
        Command::Show { id } => match tasks.get_one(&TaskId::new(id.clone())).await {
            Some(task) => print_task(&task),
            None => match tasks.error() {
                Some(error) => bail!(error),
                None => bail!("task {id} not found"),
            },
        },
        Command::Add {
            title,
            description,
            status,
            deadline,
        } => {
            let mut input = NewTask::new(title);
            input.description = description;
            input.status = status;
            input.deadline = deadline;
            print_task(&tasks.create(input).await?);
        }
        Command::Edit {
            id,
            title,
            description,
            clear_description,
            status,
            deadline,
            clear_deadline,
        } => {
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                status,
                deadline: if clear_deadline {
                    Some(None)
                } else {
                    deadline.map(Some)
                },
            };
            if patch.is_empty() {
                bail!("nothing to change");
            }
            print_task(&tasks.update(&TaskId::new(id), patch).await?);
        }
        Command::Done { id } => {
            let patch = TaskPatch::new().status(TaskStatus::Done);
            print_task(&tasks.update(&TaskId::new(id), patch).await?);
        }
        Command::Rm { id } => {
            tasks.delete(&TaskId::new(id.clone())).await?;
            println!("deleted {id}");
        }
        Command::Summary => {
            let summary = tasks.summary();
            println!("total        {}", summary.counts.total);
            for status in TaskStatus::ALL {
                println!("{:<12} {}", status.as_str(), summary.counts.get(status));
            }
        }
        Command::Demo => demo(tasks).await?,
    }
    Ok(())
}

/// in-memory ストアで一通りの操作を流す
async fn demo(tasks: &TaskSync) -> anyhow::Result<()> {
    println!("== fetch");
    tasks.fetch_all().await?;
    print_list(&tasks.tasks());

    println!("== create");
    let milk = tasks.create(NewTask::new("Buy milk")).await?;
    tasks
        .create(NewTask::new("Write report").with_status(TaskStatus::InProgress))
        .await?;
    print_list(&tasks.tasks());

    println!("== create with empty title");
    if let Err(e) = tasks.create(NewTask::new("   ")).await {
        println!("rejected: {e}");
    }
    tasks.clear_error();

    println!("== mark done");
    tasks
        .update(&milk.id, TaskPatch::new().status(TaskStatus::Done))
        .await?;
    print_list(&tasks.tasks());

    println!("== filter: done");
    tasks.set_filter(TaskFilter::Status(TaskStatus::Done));
    print_list(&tasks.filtered_view());
    tasks.set_filter(TaskFilter::All);

    println!("== delete twice");
    tasks.delete(&milk.id).await?;
    tasks.delete(&milk.id).await?;
    print_list(&tasks.tasks());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let mut config = CliConfig::load(&cli).context("loading configuration")?;
    init_logging(&config.log_level);

    let command = cli
        .command
        .unwrap_or(Command::List {
            filter: TaskFilter::All,
        });

    if command == Command::Demo {
        config.backend = BackendKind::Memory;
    }

    let session = Arc::new(InMemorySessionProvider::new());
    let app = wire(&config, session.clone())?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let gate = tokio::spawn({
        let gate = Arc::clone(&app.gate);
        async move { gate.run(&mut shutdown_rx).await }
    });

    let signed_in = match config.session() {
        Some(s) => Some(s),
        None if command == Command::Demo => Some(Session::new(
            User {
                id: UserId::new("demo"),
                email: None,
            },
            "",
        )),
        None => None,
    };
    let Some(signed_in) = signed_in else {
        bail!("not signed in: set --user-id, TASKSYNC_USER_ID or [session] user_id");
    };

    let mut stack = app.gate.subscribe_stack();
    session.sign_in(signed_in);
    stack
        .wait_for(|s| *s == ScreenStack::Main)
        .await
        .context("auth gate stopped")?;

    // gate の初回同期を待ってからコマンドを実行する
    app.tasks.activate().await?;
    let mut state = app.tasks.subscribe();
    state.wait_for(|s| !s.loading()).await.context("task list closed")?;
    if let Some(error) = app.tasks.error() {
        bail!("initial sync failed: {error}");
    }

    info!(?command, "running command");
    let result = run_command(&app.tasks, command).await;

    session.sign_out();
    // ignore send error: the gate may already have stopped
    let _ = shutdown_tx.send(true);
    let _ = gate.await;
    result
}
