use crate::domain::command::command_trait::{Command, CommandState};
use crate::domain::utils::id::{AgentId, CommandId};

/// Holds at most one running command per agent and ticks them.
#[derive(Default)]
pub struct CommandRunner {
    active: Vec<(AgentId, Box<dyn Command>)>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the agent's running command, then starts `command`.
    ///
    /// # Returns
    /// The state `command` is in after its start.
    pub fn issue(&mut self, agent: AgentId, mut command: Box<dyn Command>) -> CommandState {
        self.cancel(&agent);

        command.start();
        let state = command.current_state();
        if state == CommandState::Running {
            self.active.push((agent, command));
        } else {
            log::debug!("{} {} finished during its start ({:?}).", command.name(), command.id(), state);
        }
        state
    }

    /// # Returns
    /// `true` if a running command was cancelled.
    pub fn cancel(&mut self, agent: &AgentId) -> bool {
        let Some(index) = self.active.iter().position(|(owner, _)| owner == agent) else {
            return false;
        };

        let (_, mut command) = self.active.remove(index);
        command.cancel();
        true
    }

    /// Ticks every running command and discards those that finished.
    pub fn update(&mut self, time: f32) {
        for (_, command) in self.active.iter_mut() {
            command.update(time);
        }

        self.active.retain(|(agent, command)| {
            let running = command.is_running();
            if !running {
                log::debug!("{} {} of agent {} finished as {:?}.", command.name(), command.id(), agent, command.current_state());
            }
            running
        });
    }

    pub fn cancel_all(&mut self) {
        for (_, mut command) in self.active.drain(..) {
            command.cancel();
        }
    }

    pub fn active_command(&self, agent: &AgentId) -> Option<&CommandId> {
        self.active.iter().find(|(owner, _)| owner == agent).map(|(_, command)| command.id())
    }

    pub fn is_idle(&self, agent: &AgentId) -> bool {
        self.active_command(agent).is_none()
    }

    pub fn running_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::cmd_move::CmdMove;
    use crate::domain::simulator::simulator_mock::MockNavigation;
    use glam::Vec3;

    fn move_command(name: &str, navigation: &std::rc::Rc<MockNavigation>, x: f32) -> Box<dyn Command> {
        Box::new(CmdMove::new(CommandId::new(name), AgentId::new("A"), navigation.clone(), Vec3::new(x, 0.0, 0.0), Vec3::X))
    }

    #[test]
    fn new_order_replaces_the_running_one() {
        let navigation = MockNavigation::new(Vec3::ZERO);
        let mut runner = CommandRunner::new();
        let agent = AgentId::new("A");

        runner.issue(agent.clone(), move_command("move-1", &navigation, 5.0));
        runner.issue(agent.clone(), move_command("move-2", &navigation, 9.0));

        assert_eq!(runner.running_count(), 1);
        assert_eq!(runner.active_command(&agent), Some(&CommandId::new("move-2")));
        assert_eq!(navigation.stop_count(), 1);
    }

    #[test]
    fn finished_commands_are_discarded_on_update() {
        let navigation = MockNavigation::new(Vec3::ZERO);
        let mut runner = CommandRunner::new();
        let agent = AgentId::new("A");
        runner.issue(agent.clone(), move_command("move-1", &navigation, 5.0));

        navigation.complete(true);
        runner.update(0.1);

        assert!(runner.is_idle(&agent));
    }
}
