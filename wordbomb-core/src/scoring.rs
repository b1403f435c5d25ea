use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wordbomb_types::{GameMode, Player, PlayerId};

/// Solo scoring: five points per letter, never less than ten.
pub fn solo_points(word: &str) -> u32 {
    let len = word.trim().chars().count() as u32;
    (len * 5).max(10)
}

/// Multiplayer scoring: the room's base plus a bonus for every letter past four.
pub fn multiplayer_points(points_per_word: u32, word: &str) -> u32 {
    let len = word.trim().chars().count() as u32;
    points_per_word + len.saturating_sub(4) * 5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    pub team_number: Option<u32>,
    pub is_bot: bool,
}

impl From<&Player> for PlayerStanding {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            score: player.score,
            team_number: player.team_number,
            is_bot: player.is_bot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_number: u32,
    pub total_score: u32,
    pub members: Vec<PlayerStanding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Standings {
    Individual(Vec<PlayerStanding>),
    Teams(Vec<TeamStanding>),
}

/// Rankings projected from a player snapshot. Holds no state.
pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Participants sorted by score, highest first. Ties keep snapshot order.
    pub fn rank_individuals(players: &[Player]) -> Vec<PlayerStanding> {
        let mut ranked: Vec<PlayerStanding> = players
            .iter()
            .filter(|p| p.is_participant())
            .map(PlayerStanding::from)
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Participants grouped by team, teams sorted by summed score. Players
    /// without a team are left out.
    pub fn rank_teams(players: &[Player]) -> Vec<TeamStanding> {
        let mut teams: BTreeMap<u32, Vec<PlayerStanding>> = BTreeMap::new();
        for player in players.iter().filter(|p| p.is_participant()) {
            if let Some(team) = player.team_number {
                teams.entry(team).or_default().push(PlayerStanding::from(player));
            }
        }

        let mut ranked: Vec<TeamStanding> = teams
            .into_iter()
            .map(|(team_number, mut members)| {
                members.sort_by(|a, b| b.score.cmp(&a.score));
                TeamStanding {
                    team_number,
                    total_score: members.iter().map(|m| m.score).sum(),
                    members,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        ranked
    }

    pub fn standings(players: &[Player], mode: GameMode) -> Standings {
        if mode.is_team_mode() {
            Standings::Teams(Self::rank_teams(players))
        } else {
            Standings::Individual(Self::rank_individuals(players))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordbomb_types::RoomCode;

    fn create_test_player(name: &str, score: u32, team: Option<u32>) -> Player {
        let mut player = Player::new(RoomCode::parse("ABC123").unwrap(), name, 3);
        player.score = score;
        player.team_number = team;
        player
    }

    #[test]
    fn test_solo_points() {
        assert_eq!(solo_points("bakery"), 30);
        assert_eq!(solo_points("cat"), 15);
        assert_eq!(solo_points("at"), 10);
    }

    #[test]
    fn test_multiplayer_points() {
        assert_eq!(multiplayer_points(50, "bake"), 50);
        assert_eq!(multiplayer_points(50, "mountain"), 70);
        assert_eq!(multiplayer_points(100, "cat"), 100);
    }

    #[test]
    fn test_rank_individuals_excludes_spectators() {
        let mut spectator = create_test_player("Watcher", 500, None);
        spectator.is_spectator = true;
        let mut gone = create_test_player("Gone", 400, None);
        gone.is_active = false;

        let players = vec![
            create_test_player("Alice", 50, None),
            spectator,
            create_test_player("Bob", 120, None),
            gone,
            create_test_player("Cara", 50, None),
        ];

        let ranked = ScoreAggregator::rank_individuals(&players);
        let names: Vec<&str> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Cara"]);
    }

    #[test]
    fn test_rank_teams_sums_members() {
        let players = vec![
            create_test_player("A1", 50, Some(1)),
            create_test_player("A2", 20, Some(1)),
            create_test_player("B1", 80, Some(2)),
            create_test_player("B2", 10, Some(2)),
            create_test_player("Loose", 999, None),
        ];

        let teams = ScoreAggregator::rank_teams(&players);
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team_number, 2);
        assert_eq!(teams[0].total_score, 90);
        assert_eq!(teams[0].members[0].name, "B1");
        assert_eq!(teams[1].total_score, 70);
    }

    #[test]
    fn test_standings_follow_mode() {
        let players = vec![create_test_player("A", 10, Some(1))];
        assert!(matches!(
            ScoreAggregator::standings(&players, GameMode::VsAll),
            Standings::Individual(_)
        ));
        assert!(matches!(
            ScoreAggregator::standings(&players, GameMode::Team2),
            Standings::Teams(_)
        ));
    }
}
