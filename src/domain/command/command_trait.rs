use std::cell::Cell;
use std::rc::Rc;

use crate::domain::utils::id::{AgentId, CommandId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Idle,
    Running,

    /// Cancelled by its issuer. Terminal.
    Cancel,

    /// Finished on its own. Terminal.
    End,
}

/// Capability a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentTarget {
    Navigation,
    AttackCapable,
    MobileBuilder,
    ResourceCarrier,
}

/// Shared handle on the state of one command.
///
/// Movement and parking callbacks hold a clone, so they can end the command
/// after the call that registered them returned.
#[derive(Debug, Clone)]
pub struct CommandStatus(Rc<Cell<CommandState>>);

impl CommandStatus {
    pub fn new() -> Self {
        CommandStatus(Rc::new(Cell::new(CommandState::Idle)))
    }

    pub fn get(&self) -> CommandState {
        self.0.get()
    }

    pub(crate) fn set(&self, state: CommandState) {
        self.0.set(state);
    }

    /// Ends a running command.
    ///
    /// # Returns
    /// `false` if the command was not running, in which case nothing changes.
    pub fn end(&self) -> bool {
        if self.0.get() != CommandState::Running {
            return false;
        }
        self.0.set(CommandState::End);
        true
    }
}

impl Default for CommandStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CommandBase {
    id: CommandId,
    agent: AgentId,
    status: CommandStatus,
}

impl CommandBase {
    pub fn new(id: CommandId, agent: AgentId) -> Self {
        CommandBase { id, agent, status: CommandStatus::new() }
    }

    pub fn id(&self) -> &CommandId {
        &self.id
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn status(&self) -> &CommandStatus {
        &self.status
    }
}

/// One gameplay order with the lifecycle `Idle -> Running -> {Cancel | End}`.
///
/// Implementors provide the hooks; `start`, `update` and `cancel` guard the state
/// transitions, so a hook only runs in the state it was written for.
pub trait Command {
    fn base(&self) -> &CommandBase;

    fn name(&self) -> &'static str;

    fn component_target(&self) -> ComponentTarget;

    /// Runs once, with the command already `Running`. May end it right away.
    fn on_start(&mut self);

    /// Runs once per tick while `Running`. `time` is the simulation time in seconds.
    fn on_update(&mut self, _time: f32) {}

    /// Must stop every movement or docking the command started.
    fn on_cancel(&mut self);

    fn id(&self) -> &CommandId {
        self.base().id()
    }

    fn current_state(&self) -> CommandState {
        self.base().status().get()
    }

    fn is_running(&self) -> bool {
        self.current_state() == CommandState::Running
    }

    fn start(&mut self) {
        if self.current_state() != CommandState::Idle {
            log::warn!("{} {} cannot start in state {:?}.", self.name(), self.id(), self.current_state());
            return;
        }

        log::debug!("{} {} started for agent {}.", self.name(), self.id(), self.base().agent());
        self.base().status().set(CommandState::Running);
        self.on_start();
    }

    fn update(&mut self, time: f32) {
        if self.is_running() {
            self.on_update(time);
        }
    }

    fn cancel(&mut self) {
        if !self.is_running() {
            log::debug!("{} {} is {:?}, cancel ignored.", self.name(), self.id(), self.current_state());
            return;
        }

        log::debug!("{} {} cancelled.", self.name(), self.id());
        self.base().status().set(CommandState::Cancel);
        self.on_cancel();
    }

    fn end(&self) {
        if self.base().status().end() {
            log::debug!("{} {} ended.", self.name(), self.id());
        }
    }
}
