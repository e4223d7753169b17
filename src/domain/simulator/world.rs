use glam::Vec3;
use serde::Serialize;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::api::parking_dto::ParkingDto;
use crate::api::scenario_dto::{AgentDto, FacilityDto, ScenarioDto};
use crate::domain::capability::navigation_trait::Navigation;
use crate::domain::command::cmd_move::CmdMove;
use crate::domain::command::command_runner::CommandRunner;
use crate::domain::parkable::parkable::Parkable;
use crate::domain::parkable::parking_events::{ParkingCallbacks, ParkingPhase};
use crate::domain::parking::orbital_parking::OrbitalParking;
use crate::domain::parking::parking_trait::Parking;
use crate::domain::parking::queued_wait_parking::QueuedWaitParking;
use crate::domain::simulator::kinematic_navigation::KinematicNavigation;
use crate::domain::simulator::simulator::{SimulationClock, SystemSimulator};
use crate::domain::utils::geometry::{FacilityTransform, Pose};
use crate::domain::utils::id::{AgentId, CommandId, FacilityId};
use crate::error::Error;

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub ticks_run: u64,

    /// Every agent finished its visits and its rally move.
    pub completed: bool,

    /// Every scheduler satisfied its invariants after every tick.
    pub consistent: bool,

    pub docks_per_agent: BTreeMap<String, usize>,

    /// Highest number of agents parked at the same time, per facility.
    pub max_parked_per_facility: BTreeMap<String, usize>,
}

struct SimulatedAgent {
    id: AgentId,
    navigation: Rc<KinematicNavigation>,
    parkable: Rc<Parkable>,
    facility: Rc<dyn Parking>,
    dwell_time: f32,
    visits: usize,
    requests_issued: usize,
    docks: Rc<Cell<usize>>,
    parked_since: Rc<Cell<Option<f32>>>,
    rally_point: Option<Vec3>,
    rally_issued: bool,
}

/// Headless driver: agents visit their facility `visits` times, stay parked for
/// their dwell time and finally walk to their rally point.
pub struct SimulationWorld {
    clock: Rc<SimulationClock>,
    default_ticks: u64,
    facilities: Vec<Rc<dyn Parking>>,
    agents: Vec<SimulatedAgent>,
    runner: CommandRunner,
    consistent: bool,
    max_parked: BTreeMap<String, usize>,
}

impl SimulationWorld {
    /// Number of ticks the scenario file asks for.
    pub fn default_ticks(&self) -> u64 {
        self.default_ticks
    }

    pub fn clock(&self) -> &Rc<SimulationClock> {
        &self.clock
    }

    pub fn facility(&self, id: &str) -> Option<&Rc<dyn Parking>> {
        self.facilities.iter().find(|facility| facility.id().as_str() == id)
    }

    pub fn parkable(&self, id: &str) -> Option<&Rc<Parkable>> {
        self.agents.iter().find(|agent| agent.id.as_str() == id).map(|agent| &agent.parkable)
    }

    /// Runs until every agent is done or `ticks` ticks passed, then shuts the facilities down.
    pub fn run(&mut self, ticks: u64) -> ScenarioReport {
        log::info!("Running scenario: {} facilities, {} agents, at most {} ticks.", self.facilities.len(), self.agents.len(), ticks);

        let mut ticks_run = 0;
        let mut completed = self.is_done();
        while !completed && ticks_run < ticks {
            self.tick();
            ticks_run += 1;
            completed = self.is_done();
        }

        if !completed {
            log::warn!("Scenario stopped after {} ticks with agents still busy.", ticks_run);
        }
        self.shutdown();

        let report = ScenarioReport {
            ticks_run,
            completed,
            consistent: self.consistent,
            docks_per_agent: self.agents.iter().map(|agent| (agent.id.to_string(), agent.docks.get())).collect(),
            max_parked_per_facility: self.max_parked.clone(),
        };

        log::info!("Scenario finished after {} ticks, completed: {}.", report.ticks_run, report.completed);
        report
    }

    /// Advances the world by one tick.
    pub fn tick(&mut self) {
        let delta_time = self.clock.tick_length();
        self.clock.advance();
        let now = self.clock.get_current_time_in_s();

        for agent in &self.agents {
            agent.navigation.advance(delta_time);
        }

        for agent in self.agents.iter_mut() {
            Self::drive_agent(agent, &mut self.runner, &self.clock, now);
        }

        self.runner.update(now);
        self.record_statistics();
    }

    /// Cancels every outstanding order and parking request.
    pub fn shutdown(&mut self) {
        self.runner.cancel_all();
        for facility in &self.facilities {
            facility.cancel_all_parking_requests();
        }
    }

    fn drive_agent(agent: &mut SimulatedAgent, runner: &mut CommandRunner, clock: &Rc<SimulationClock>, now: f32) {
        match agent.parkable.phase() {
            ParkingPhase::Idle if agent.requests_issued < agent.visits => {
                agent.requests_issued += 1;
                agent.parked_since.set(None);

                let docks = agent.docks.clone();
                let parked_since = agent.parked_since.clone();
                let clock = clock.clone();
                let callbacks = ParkingCallbacks::new().on_enter(move |_| {
                    docks.set(docks.get() + 1);
                    parked_since.set(Some(clock.get_current_time_in_s()));
                });

                log::debug!("Agent {} starts visit {}/{} to {}.", agent.id, agent.requests_issued, agent.visits, agent.facility.id());
                agent.parkable.request_parking_slot(agent.facility.clone(), callbacks);
            }
            ParkingPhase::Idle if !agent.rally_issued => {
                agent.rally_issued = true;
                if let Some(rally_point) = agent.rally_point {
                    let navigation: Rc<dyn Navigation> = agent.navigation.clone();
                    let command = CmdMove::new(CommandId::new(format!("{}-rally", agent.id)), agent.id.clone(), navigation, rally_point, Vec3::ZERO);
                    runner.issue(agent.id.clone(), Box::new(command));
                }
            }
            ParkingPhase::Parked => {
                if agent.parked_since.get().is_some_and(|since| now - since >= agent.dwell_time) {
                    agent.parkable.cancel_parking_request();
                }
            }
            _ => {}
        }
    }

    fn record_statistics(&mut self) {
        let mut parked: HashMap<&FacilityId, usize> = HashMap::new();
        for agent in &self.agents {
            if agent.parkable.is_parked() {
                *parked.entry(agent.facility.id()).or_default() += 1;
            }
        }

        for facility in &self.facilities {
            let count = parked.get(facility.id()).copied().unwrap_or(0);
            let max = self.max_parked.entry(facility.id().to_string()).or_default();
            *max = (*max).max(count);

            if !facility.base().scheduler().is_consistent() {
                log::error!("Scheduler of facility {} is inconsistent at {:.2}s.", facility.id(), self.clock.get_current_time_in_s());
                self.consistent = false;
            }
        }
    }

    fn is_done(&self) -> bool {
        self.agents.iter().all(|agent| {
            agent.requests_issued >= agent.visits
                && agent.parkable.phase() == ParkingPhase::Idle
                && (agent.rally_issued || agent.rally_point.is_none())
                && self.runner.is_idle(&agent.id)
        })
    }

    fn build_facility(dto: FacilityDto) -> Result<Rc<dyn Parking>, Error> {
        let id = FacilityId::new(dto.id);
        let transform = FacilityTransform::new(Pose::from_yaw_degrees(Vec3::from_array(dto.position), dto.yaw_degrees));

        let parking: Rc<dyn Parking> = match dto.parking {
            ParkingDto::Orbital(orbital) => Rc::new(OrbitalParking::try_from((orbital, id, transform))?),
            ParkingDto::QueuedWait(queued) => Rc::new(QueuedWaitParking::try_from((queued, id, transform))?),
        };
        Ok(parking)
    }

    fn build_agent(dto: AgentDto, facilities: &[Rc<dyn Parking>]) -> Result<SimulatedAgent, Error> {
        if dto.speed <= 0.0 {
            return Err(Error::WorldConstructionError(format!("agent {} needs a positive speed, got {}", dto.id, dto.speed)));
        }

        let facility = facilities
            .iter()
            .find(|facility| facility.id().as_str() == dto.facility)
            .cloned()
            .ok_or_else(|| Error::UnknownFacility { agent: dto.id.clone(), facility: dto.facility.clone() })?;

        let id = AgentId::new(dto.id);
        let navigation = KinematicNavigation::new(id.clone(), Vec3::from_array(dto.position), dto.speed);
        let parkable = Parkable::new(id.clone(), navigation.clone());

        Ok(SimulatedAgent {
            id,
            navigation,
            parkable,
            facility,
            dwell_time: dto.dwell_time,
            visits: dto.visits,
            requests_issued: 0,
            docks: Rc::new(Cell::new(0)),
            parked_since: Rc::new(Cell::new(None)),
            rally_point: dto.rally_point.map(Vec3::from_array),
            rally_issued: false,
        })
    }
}

impl TryFrom<ScenarioDto> for SimulationWorld {
    type Error = Error;

    fn try_from(dto: ScenarioDto) -> Result<Self, Self::Error> {
        if dto.tick_length <= 0.0 {
            return Err(Error::WorldConstructionError(format!("tickLength must be positive, got {}", dto.tick_length)));
        }

        let mut facilities: Vec<Rc<dyn Parking>> = Vec::with_capacity(dto.facilities.len());
        for facility_dto in dto.facilities {
            if facilities.iter().any(|facility| facility.id().as_str() == facility_dto.id) {
                return Err(Error::WorldConstructionError(format!("duplicate facility id {}", facility_dto.id)));
            }
            facilities.push(Self::build_facility(facility_dto)?);
        }

        let agents = dto.agents.into_iter().map(|agent_dto| Self::build_agent(agent_dto, &facilities)).collect::<Result<Vec<_>, Error>>()?;

        log::info!("Simulation world built: {} facilities, {} agents.", facilities.len(), agents.len());

        Ok(SimulationWorld {
            clock: Rc::new(SimulationClock::new(dto.tick_length)),
            default_ticks: dto.ticks,
            facilities,
            agents,
            runner: CommandRunner::new(),
            consistent: true,
            max_parked: BTreeMap::new(),
        })
    }
}
