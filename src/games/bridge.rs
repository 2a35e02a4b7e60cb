//! Single-agent puzzle: a squad of motorbikes rides down a four-lane road full
//! of holes and has to bring enough of them across the bridge at its end.
//!
//! All bikes share the position along the road and the speed. Each turn the
//! squad accelerates, brakes, jumps, changes lanes or just keeps riding, then
//! moves forward by its speed. A bike falls into a hole if it rides over one,
//! except when jumping: then only the landing cell matters. Changing lanes
//! moves along the old lane up to (but not including) the last cell and
//! along the new lane up to the last cell.
//!
//! There is no opponent: [`Game::ALTERNATING`] is `false` and every state is
//! scored for the squad.
//!
//! The road never changes, so states are pushed onto a bounded history and
//! undoing a command just pops the latest one.

use std::fmt;
use std::ops::Range;

use anyhow::{bail, ensure};
use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::evaluation::Score;
use crate::game::{self, Game, MoveList, Outcome};
use crate::zobrist::{Key, Zobrist};

/// Number of lanes on the road.
pub const LANES: usize = 4;
/// The squad can not go faster.
pub const MAX_SPEED: u8 = 50;
/// The puzzle is lost if the bridge is not reached within this many turns.
pub const MAX_TURNS: u8 = 50;

const HISTORY: usize = MAX_TURNS as usize + 1;

bitflags! {
    /// Lanes that still have a bike on them. Lane 0 is the top one.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Lanes: u8 {
        #[allow(missing_docs)]
        const FIRST = 1;
        #[allow(missing_docs)]
        const SECOND = 1 << 1;
        #[allow(missing_docs)]
        const THIRD = 1 << 2;
        #[allow(missing_docs)]
        const FOURTH = 1 << 3;
    }
}

impl Lanes {
    /// Set with a single lane.
    ///
    /// # Panics
    ///
    /// Panics if `lane` is not below [`LANES`].
    #[must_use]
    pub fn lane(lane: usize) -> Self {
        assert!(lane < LANES, "there are only {LANES} lanes");
        Self::from_bits_truncate(1 << lane)
    }

    /// Number of bikes.
    #[must_use]
    pub const fn count(self) -> u8 {
        self.bits().count_ones() as u8
    }
}

/// Command given to the whole squad.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Speed,
    Slow,
    Jump,
    Up,
    Down,
    Wait,
}

impl game::Action for Command {
    fn index(self) -> u16 {
        self as u16
    }

    fn is_null(self) -> bool {
        self == Self::Wait
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Speed => "SPEED",
                Self::Slow => "SLOW",
                Self::Jump => "JUMP",
                Self::Up => "UP",
                Self::Down => "DOWN",
                Self::Wait => "WAIT",
            }
        )
    }
}

/// Road layout: holes on each lane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Road {
    length: usize,
    /// `holes_before[lane][x]` is the number of holes in cells `0..x`.
    holes_before: [Vec<u16>; LANES],
}

impl Road {
    /// Parses one string per lane, `.` for road and `0` for a hole. All lanes
    /// must have the same length.
    ///
    /// # Errors
    ///
    /// Fails on malformed lanes.
    pub fn parse<S: AsRef<str>>(lanes: &[S]) -> anyhow::Result<Self> {
        ensure!(
            lanes.len() == LANES,
            "road should have {LANES} lanes, got {}",
            lanes.len()
        );
        let length = lanes[0].as_ref().len();
        ensure!(length > 0, "road can not be empty");
        ensure!(
            length < usize::from(u16::MAX - u16::from(MAX_SPEED)),
            "road is too long: {length}"
        );
        let mut holes_before: [Vec<u16>; LANES] = Default::default();
        for (lane, cells) in lanes.iter().map(AsRef::as_ref).enumerate() {
            ensure!(
                cells.len() == length,
                "all lanes should have length {length}, got {cells}"
            );
            let prefix = &mut holes_before[lane];
            prefix.reserve_exact(length + 1);
            prefix.push(0);
            let mut holes = 0;
            for symbol in cells.chars() {
                match symbol {
                    '.' => {},
                    '0' => holes += 1,
                    _ => bail!("unknown road symbol: '{symbol}'"),
                }
                prefix.push(holes);
            }
        }
        Ok(Self {
            length,
            holes_before,
        })
    }

    /// Number of cells before the bridge.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Number of holes among `cells` of the lane. The bridge has none.
    fn holes(&self, lane: usize, cells: Range<usize>) -> u16 {
        let end = cells.end.min(self.length);
        let start = cells.start.min(end);
        self.holes_before[lane][end] - self.holes_before[lane][start]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct State {
    position: u16,
    speed: u8,
    bikes: Lanes,
    turn: u8,
    key: Key,
}

/// Zobrist feature layout: position, speed, one feature per occupied lane,
/// turn.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Features {
    zobrist: Zobrist,
    speed_offset: usize,
    lane_offset: usize,
    turn_offset: usize,
}

impl Features {
    fn new(road_length: usize, seed: u64) -> Self {
        // Positions stay below `length + MAX_SPEED`: moving on from the bridge
        // is not possible.
        let speed_offset = road_length + usize::from(MAX_SPEED);
        let lane_offset = speed_offset + usize::from(MAX_SPEED) + 1;
        let turn_offset = lane_offset + LANES;
        Self {
            zobrist: Zobrist::new(turn_offset + usize::from(MAX_TURNS) + 1, seed),
            speed_offset,
            lane_offset,
            turn_offset,
        }
    }

    fn position(&self, position: u16) -> Key {
        self.zobrist.key(usize::from(position))
    }

    fn speed(&self, speed: u8) -> Key {
        self.zobrist.key(self.speed_offset + usize::from(speed))
    }

    fn lanes(&self, lanes: Lanes) -> Key {
        (0..LANES)
            .filter(|&lane| lanes.contains(Lanes::lane(lane)))
            .fold(0, |key, lane| key ^ self.zobrist.key(self.lane_offset + lane))
    }

    fn turn(&self, turn: u8) -> Key {
        self.zobrist.key(self.turn_offset + usize::from(turn))
    }

    fn compose(&self, state: &State) -> Key {
        self.position(state.position)
            ^ self.speed(state.speed)
            ^ self.lanes(state.bikes)
            ^ self.turn(state.turn)
    }
}

/// The puzzle: road, squad and the states visited so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bridge {
    road: Road,
    min_bikes: u8,
    features: Features,
    states: ArrayVec<State, HISTORY>,
}

impl Bridge {
    /// Squad standing at the start of the road with the given bikes and
    /// speed. At least `min_bikes` of them have to survive.
    ///
    /// # Errors
    ///
    /// Fails if the squad is impossible: no bikes, fewer bikes than required,
    /// a bike starting in a hole or a speed above [`MAX_SPEED`].
    pub fn new(road: Road, bikes: Lanes, speed: u8, min_bikes: u8, seed: u64) -> anyhow::Result<Self> {
        ensure!(min_bikes > 0, "at least one bike has to survive");
        ensure!(
            bikes.count() >= min_bikes,
            "{} bikes can not satisfy the minimum of {min_bikes}",
            bikes.count()
        );
        ensure!(speed <= MAX_SPEED, "speed {speed} is above {MAX_SPEED}");
        for lane in (0..LANES).filter(|&lane| bikes.contains(Lanes::lane(lane))) {
            ensure!(road.holes(lane, 0..1) == 0, "bike on lane {lane} starts in a hole");
        }
        let features = Features::new(road.length, seed);
        let mut state = State {
            position: 0,
            speed,
            bikes,
            turn: 0,
            key: 0,
        };
        state.key = features.compose(&state);
        let mut states = ArrayVec::new();
        states.push(state);
        Ok(Self {
            road,
            min_bikes,
            features,
            states,
        })
    }

    fn state(&self) -> &State {
        // The initial state is never popped.
        &self.states[self.states.len() - 1]
    }

    /// Distance travelled from the start of the road.
    #[must_use]
    pub fn position(&self) -> u16 {
        self.state().position
    }

    /// Current speed.
    #[must_use]
    pub fn speed(&self) -> u8 {
        self.state().speed
    }

    /// Lanes with surviving bikes.
    #[must_use]
    pub fn bikes(&self) -> Lanes {
        self.state().bikes
    }

    /// Number of commands given so far.
    #[must_use]
    pub fn turn(&self) -> u8 {
        self.state().turn
    }

    /// Bikes required to survive.
    #[must_use]
    pub const fn min_bikes(&self) -> u8 {
        self.min_bikes
    }

    /// Whether the bike on `lane` survives `command` at `speed` (already
    /// updated by the command), and the lane it ends up on.
    fn ride(&self, lane: usize, position: usize, speed: usize, command: Command) -> (usize, bool) {
        let last = position + speed;
        let crossed = position + 1..last + 1;
        match command {
            Command::Jump => (lane, speed == 0 || self.road.holes(lane, last..last + 1) == 0),
            Command::Up | Command::Down => {
                let target = if command == Command::Up {
                    lane - 1
                } else {
                    lane + 1
                };
                let alive = self.road.holes(lane, position + 1..last) == 0
                    && self.road.holes(target, crossed) == 0;
                (target, alive)
            },
            Command::Speed | Command::Slow | Command::Wait => {
                (lane, self.road.holes(lane, crossed) == 0)
            },
        }
    }

    /// Speed and surviving bikes after `command`, which must be legal.
    fn advance(&self, state: &State, command: Command) -> (u8, Lanes) {
        let speed = match command {
            Command::Speed => state.speed + 1,
            Command::Slow => state.speed - 1,
            _ => state.speed,
        };
        let position = usize::from(state.position);
        let mut bikes = Lanes::empty();
        for lane in (0..LANES).filter(|&lane| state.bikes.contains(Lanes::lane(lane))) {
            let (target, alive) = self.ride(lane, position, usize::from(speed), command);
            if alive {
                bikes |= Lanes::lane(target);
            }
        }
        (speed, bikes)
    }
}

impl Game for Bridge {
    type Action = Command;
    type Undo = ();

    const ALTERNATING: bool = false;

    fn apply(&mut self, command: Command) {
        let state = *self.state();
        assert!(
            usize::from(state.position) < self.road.length && state.turn < MAX_TURNS,
            "the puzzle is over"
        );
        match command {
            Command::Speed => {
                assert!(state.speed < MAX_SPEED, "can not go faster than {MAX_SPEED}");
            },
            Command::Slow => assert!(state.speed > 0, "can not slow down when standing"),
            Command::Up => assert!(!state.bikes.contains(Lanes::FIRST), "can not move up"),
            Command::Down => assert!(!state.bikes.contains(Lanes::FOURTH), "can not move down"),
            Command::Jump | Command::Wait => {},
        }
        let (speed, bikes) = self.advance(&state, command);
        let mut next = State {
            position: state.position + u16::from(speed),
            speed,
            bikes,
            turn: state.turn + 1,
            key: state.key,
        };
        next.key ^= self.features.position(state.position)
            ^ self.features.position(next.position)
            ^ self.features.speed(state.speed)
            ^ self.features.speed(next.speed)
            ^ self.features.lanes(state.bikes ^ next.bikes)
            ^ self.features.turn(state.turn)
            ^ self.features.turn(next.turn);
        self.states.push(next);
    }

    fn undo(&mut self, (): ()) {
        assert!(self.states.len() > 1, "undo without a matching move");
        let _ = self.states.pop();
    }

    fn generate_moves(&self, moves: &mut MoveList<Command>) {
        if self.is_terminal() {
            return;
        }
        let state = self.state();
        if state.speed < MAX_SPEED {
            moves.push(Command::Speed);
        }
        moves.push(Command::Jump);
        if !state.bikes.contains(Lanes::FIRST) {
            moves.push(Command::Up);
        }
        if !state.bikes.contains(Lanes::FOURTH) {
            moves.push(Command::Down);
        }
        if state.speed > 0 {
            moves.push(Command::Slow);
        }
        moves.push(Command::Wait);
    }

    fn outcome(&self) -> Option<Outcome> {
        let state = self.state();
        if state.bikes.count() < self.min_bikes {
            return Some(Outcome::Loss);
        }
        if usize::from(state.position) >= self.road.length {
            return Some(Outcome::Win);
        }
        if state.turn >= MAX_TURNS {
            return Some(Outcome::Loss);
        }
        None
    }

    fn key(&self) -> Key {
        self.state().key
    }

    /// Commands keeping more bikes alive come first.
    fn move_priority(&self, command: Command) -> i32 {
        let (_, bikes) = self.advance(self.state(), command);
        i32::from(bikes.count())
    }
}

impl fmt::Display for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        write!(
            f,
            "turn {} position {}/{} speed {} bikes {}",
            state.turn,
            state.position,
            self.road.length,
            state.speed,
            state.bikes.count()
        )
    }
}

/// Rewards the distance the squad will have covered after the next turn and
/// the bikes it can still afford to lose. Every turn used costs a little, so
/// standing still is never as good as riding on.
#[must_use]
pub fn evaluate(game: &Bridge) -> Score {
    let state = game.state();
    let progress = i32::from(state.position) + i32::from(state.speed);
    let spare = i32::from(state.bikes.count()) - i32::from(game.min_bikes);
    Score::saturating(2 * progress + 40 * spare - 3 * i32::from(state.turn))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::game::Action;

    fn road(lanes: [&str; LANES]) -> Road {
        Road::parse(&lanes).unwrap()
    }

    fn open_road(length: usize) -> Road {
        let lane = ".".repeat(length);
        Road::parse(&[&lane, &lane, &lane, &lane]).unwrap()
    }

    fn moves(game: &Bridge) -> Vec<Command> {
        let mut moves = MoveList::new();
        game.generate_moves(&mut moves);
        moves.to_vec()
    }

    #[test]
    fn parse_road() {
        let parsed = road(["..0.", "....", "0...", "...."]);
        assert_eq!(parsed.length(), 4);
        assert_eq!(parsed.holes(0, 0..4), 1);
        assert_eq!(parsed.holes(0, 3..10), 0);
        assert_eq!(parsed.holes(2, 0..1), 1);
        assert!(Road::parse(&["...", "...", "..."]).is_err());
        assert!(Road::parse(&["...", "...", "...", "...."]).is_err());
        assert!(Road::parse(&["...", "...", "...", "..x"]).is_err());
        assert!(Road::parse(&["", "", "", ""]).is_err());
    }

    #[test]
    fn invalid_squads() {
        let lanes = Lanes::FIRST | Lanes::SECOND;
        assert!(Bridge::new(open_road(5), lanes, 0, 3, 0).is_err());
        assert!(Bridge::new(open_road(5), lanes, 0, 0, 0).is_err());
        assert!(Bridge::new(open_road(5), lanes, MAX_SPEED + 1, 1, 0).is_err());
        let holed = road(["0....", ".....", ".....", "....."]);
        assert!(Bridge::new(holed, lanes, 0, 1, 0).is_err());
    }

    #[test]
    fn commands() {
        let game = Bridge::new(open_road(5), Lanes::FIRST, 0, 1, 0).unwrap();
        assert_eq!(
            moves(&game),
            vec![Command::Speed, Command::Jump, Command::Down, Command::Wait]
        );
        let game = Bridge::new(open_road(5), Lanes::SECOND, 3, 1, 0).unwrap();
        assert_eq!(
            moves(&game),
            vec![
                Command::Speed,
                Command::Jump,
                Command::Up,
                Command::Down,
                Command::Slow,
                Command::Wait
            ]
        );
        assert!(Command::Wait.is_null());
        assert!(!Command::Jump.is_null());
        assert_eq!(Command::Down.to_string(), "DOWN");
    }

    #[test]
    fn riding_over_a_hole_kills() {
        let layout = road(["...0..", "......", "......", "......"]);
        let mut game = Bridge::new(layout, Lanes::FIRST | Lanes::SECOND, 3, 1, 0).unwrap();
        game.apply(Command::Wait);
        assert_eq!(game.bikes(), Lanes::SECOND);
        assert_eq!(game.position(), 3);
        assert_eq!(game.turn(), 1);
    }

    #[test]
    fn jumping_only_checks_the_landing_cell() {
        let layout = road(["...0..", "......", "......", "......"]);
        let mut game = Bridge::new(layout, Lanes::FIRST | Lanes::SECOND, 3, 1, 0).unwrap();
        // Riding at speed 4 crosses the hole at 3.
        game.apply(Command::Speed);
        assert_eq!(game.bikes(), Lanes::SECOND);
        game.undo(());
        // Jumping at speed 3 lands in it.
        game.apply(Command::Jump);
        assert_eq!(game.bikes(), Lanes::SECOND);
        game.undo(());
        game.apply(Command::Slow);
        game.apply(Command::Jump);
        // Landed on 2, then jumped over the hole at 3 to 4.
        assert_eq!(game.position(), 4);
        assert_eq!(game.bikes(), Lanes::FIRST | Lanes::SECOND);
    }

    #[test]
    fn changing_lanes_checks_both_lanes() {
        let layout = road(["......", "..0...", "......", "......"]);
        let mut game = Bridge::new(layout.clone(), Lanes::FIRST, 3, 1, 0).unwrap();
        game.apply(Command::Down);
        assert_eq!(game.bikes(), Lanes::empty());
        assert_eq!(game.outcome(), Some(Outcome::Loss));

        let mut game = Bridge::new(layout.clone(), Lanes::FIRST, 1, 1, 0).unwrap();
        game.apply(Command::Down);
        assert_eq!(game.bikes(), Lanes::SECOND);

        // The hole is on the old lane right before the last cell.
        let mut game = Bridge::new(layout, Lanes::SECOND, 3, 1, 0).unwrap();
        game.apply(Command::Up);
        assert_eq!(game.bikes(), Lanes::empty());
    }

    #[test]
    fn outcomes() {
        let mut game = Bridge::new(open_road(3), Lanes::THIRD, 3, 1, 0).unwrap();
        assert_eq!(game.outcome(), None);
        game.apply(Command::Wait);
        assert_eq!(game.outcome(), Some(Outcome::Win));
        assert!(moves(&game).is_empty());

        let mut game = Bridge::new(open_road(3), Lanes::THIRD, 0, 1, 0).unwrap();
        for _ in 0..MAX_TURNS {
            assert_eq!(game.outcome(), None);
            game.apply(Command::Wait);
        }
        assert_eq!(game.outcome(), Some(Outcome::Loss));
    }

    #[test]
    fn apply_and_undo_restore_everything() {
        let layout = road(["..0...", "....0.", "......", ".0...."]);
        let mut game = Bridge::new(layout, Lanes::all(), 1, 2, 9).unwrap();
        let initial = game.clone();
        for command in [Command::Speed, Command::Up, Command::Jump] {
            if game.is_terminal() {
                break;
            }
            game.apply(command);
            assert_eq!(game.key(), game.features.compose(game.state()));
        }
        while game.turn() > 0 {
            game.undo(());
        }
        assert_eq!(game, initial);
    }

    #[test]
    #[should_panic(expected = "undo without a matching move")]
    fn undo_without_apply() {
        let mut game = Bridge::new(open_road(3), Lanes::FIRST, 0, 1, 0).unwrap();
        game.undo(());
    }

    #[test]
    fn transpositions_share_keys() {
        let mut a = Bridge::new(open_road(20), Lanes::FIRST, 2, 1, 0).unwrap();
        let mut b = a.clone();
        a.apply(Command::Wait);
        a.apply(Command::Jump);
        b.apply(Command::Jump);
        b.apply(Command::Wait);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.position(), 4);
    }

    #[test]
    fn evaluation_rewards_progress() {
        let slow = Bridge::new(open_road(20), Lanes::FIRST, 1, 1, 0).unwrap();
        let fast = Bridge::new(open_road(20), Lanes::FIRST, 4, 1, 0).unwrap();
        assert!(evaluate(&fast) > evaluate(&slow));
    }

    #[test]
    fn standing_still_costs_turns() {
        let mut game = Bridge::new(open_road(20), Lanes::FIRST, 0, 1, 0).unwrap();
        let before = evaluate(&game);
        game.apply(Command::Wait);
        let stalled = evaluate(&game);
        assert!(stalled < before);
        game.undo(());
        game.apply(Command::Speed);
        assert!(evaluate(&game) > stalled);
    }

    #[test]
    fn safe_commands_are_searched_first() {
        let layout = road(["...0..", "......", "......", "......"]);
        let game = Bridge::new(layout, Lanes::FIRST | Lanes::SECOND, 3, 1, 0).unwrap();
        // Riding on at speed 3 or 4 crosses the hole, so does jumping into it.
        for command in [Command::Wait, Command::Speed, Command::Jump] {
            assert_eq!(game.move_priority(command), 1, "{command}");
        }
        // Braking stops right in front of it, moving down dodges it.
        for command in [Command::Slow, Command::Down] {
            assert_eq!(game.move_priority(command), 2, "{command}");
        }

        let mut moves = MoveList::new();
        game.generate_moves(&mut moves);
        moves.sort_by_key(|&command| std::cmp::Reverse(game.move_priority(command)));
        assert_eq!(
            moves.to_vec(),
            vec![
                Command::Down,
                Command::Slow,
                Command::Speed,
                Command::Jump,
                Command::Wait
            ]
        );
        assert_eq!(game.turn(), 0);
    }
}
