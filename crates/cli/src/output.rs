// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared `--json`/`--quiet`/human-table rendering for list and show commands.

use sf_core::{Agent, Document, Task};

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
}

pub fn print_value(mode: OutputMode, value: &impl serde::Serialize, human: impl FnOnce()) {
    if mode.json {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(error) => eprintln!("failed to serialize response: {error}"),
        }
    } else {
        human();
    }
}

pub fn print_tasks(mode: OutputMode, tasks: &[Task]) {
    print_value(mode, &tasks, || {
        if mode.quiet {
            for t in tasks {
                println!("{}", t.id);
            }
            return;
        }
        println!("{:<14} {:<10} {:<5} {:<5} {:<8} TITLE", "ID", "STATUS", "PRI", "CPX", "TYPE");
        for t in tasks {
            println!(
                "{:<14} {:<10} {:<5} {:<5} {:<8} {}",
                short_id(&t.id.to_string()),
                t.status,
                t.priority,
                t.complexity,
                task_type_label(t.task_type),
                t.title
            );
        }
    });
}

pub fn print_task(mode: OutputMode, task: &Task) {
    print_value(mode, task, || {
        if mode.quiet {
            println!("{}", task.content_summary());
            return;
        }
        println!("id:         {}", task.id);
        println!("title:      {}", task.title);
        println!("status:     {}", task.status);
        println!("type:       {}", task_type_label(task.task_type));
        println!("priority:   {}", task.priority);
        println!("complexity: {}", task.complexity);
        if let Some(assignee) = &task.assignee {
            println!("assignee:   {assignee}");
        }
        if let Some(closed_at) = task.closed_at {
            println!("closed_at:  {closed_at}");
        }
    });
}

pub fn print_documents(mode: OutputMode, documents: &[Document]) {
    print_value(mode, &documents, || {
        if mode.quiet {
            for d in documents {
                println!("{}", d.id);
            }
            return;
        }
        println!("{:<14} {:<10} {:<8} {:<10} VERSION", "ID", "CATEGORY", "STATUS", "TYPE");
        for d in documents {
            println!(
                "{:<14} {:<10?} {:<8?} {:<10?} {}",
                short_id(&d.id.to_string()),
                d.category,
                d.status,
                d.content_type,
                d.version
            );
        }
    });
}

pub fn print_document(mode: OutputMode, document: &Document) {
    print_value(mode, document, || {
        if mode.quiet {
            println!("{}", document.content);
            return;
        }
        println!("id:       {}", document.id);
        println!("category: {:?}", document.category);
        println!("status:   {:?}", document.status);
        println!("version:  {}", document.version);
        println!();
        println!("{}", document.content);
    });
}

pub fn print_agents(mode: OutputMode, agents: &[Agent]) {
    print_value(mode, &agents, || {
        if mode.quiet {
            for a in agents {
                println!("{}", a.id);
            }
            return;
        }
        println!("{:<14} {:<10} {:<9} {:<10} NAME", "ID", "ROLE", "SESSION", "PROVIDER");
        for a in agents {
            println!(
                "{:<14} {:<10?} {:<9?} {:<10} {}",
                short_id(&a.id.to_string()),
                a.role(),
                a.session_status,
                a.provider.as_deref().unwrap_or("-"),
                a.name
            );
        }
    });
}

pub fn print_agent(mode: OutputMode, agent: &Agent) {
    print_value(mode, agent, || {
        if mode.quiet {
            println!("{}", agent.id);
            return;
        }
        println!("id:      {}", agent.id);
        println!("name:    {}", agent.name);
        println!("role:    {:?}", agent.role());
        println!("session: {:?}", agent.session_status);
        println!("max_concurrent_tasks: {}", agent.max_concurrent_tasks);
    });
}

fn task_type_label(t: sf_core::TaskType) -> &'static str {
    match t {
        sf_core::TaskType::Bug => "bug",
        sf_core::TaskType::Feature => "feature",
        sf_core::TaskType::Task => "task",
        sf_core::TaskType::Chore => "chore",
    }
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(12)]
}

trait ContentSummary {
    fn content_summary(&self) -> String;
}

impl ContentSummary for Task {
    fn content_summary(&self) -> String {
        self.title.clone()
    }
}
