/// Loopback address used when the simulation runs on this machine
pub const LOOPBACK: &str = "127.0.0.1";

/// The robot (or simulation) a session talks to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteTarget {
    pub team: u32,
    pub host: String,
}

impl RemoteTarget {
    /// Resolve the host for a team
    ///
    /// An explicit IP wins over everything, then local simulation, then the
    /// mDNS name used when no driver station is bridging the robot network.
    /// Otherwise the robot sits at `10.TE.AM.2`.
    pub fn resolve(
        team: u32,
        ip_override: Option<&str>,
        local_simulation: bool,
        no_driver_station: bool,
    ) -> Self {
        let host = match ip_override {
            Some(ip) => ip.to_string(),
            None if local_simulation => LOOPBACK.to_string(),
            None if no_driver_station => Self::mdns_host(team),
            None => Self::team_host(team),
        };

        Self { team, host }
    }

    /// Static robot address for a team number
    pub fn team_host(team: u32) -> String {
        format!("10.{}.{}.2", team / 100, team % 100)
    }

    /// mDNS name the roboRIO advertises
    pub fn mdns_host(team: u32) -> String {
        format!("roboRIO-{team}-FRC.local")
    }

    /// Whether the host is this machine
    pub fn is_loopback(&self) -> bool {
        self.host == LOOPBACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_host() {
        assert_eq!(RemoteTarget::resolve(5024, None, false, false).host, "10.50.24.2");
        assert_eq!(RemoteTarget::resolve(254, None, false, false).host, "10.2.54.2");
        assert_eq!(RemoteTarget::resolve(1, None, false, false).host, "10.0.1.2");
    }

    #[test]
    fn test_local_simulation_overrides_team() {
        let target = RemoteTarget::resolve(5024, None, true, false);
        assert_eq!(target.host, "127.0.0.1");
        assert!(target.is_loopback());
    }

    #[test]
    fn test_ip_override_wins() {
        let target = RemoteTarget::resolve(5024, Some("192.168.1.20"), true, true);
        assert_eq!(target.host, "192.168.1.20");
        assert_eq!(target.team, 5024);
    }

    #[test]
    fn test_no_driver_station_uses_mdns() {
        assert_eq!(
            RemoteTarget::resolve(5024, None, false, true).host,
            "roboRIO-5024-FRC.local"
        );
        assert_eq!(RemoteTarget::resolve(5024, None, true, true).host, "127.0.0.1");
    }
}
