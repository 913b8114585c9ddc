use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Home,
    Calendar,
    Gantt,
    Dashboard,
    Management,
    Profile,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Login,
        Route::Register,
        Route::Home,
        Route::Calendar,
        Route::Gantt,
        Route::Dashboard,
        Route::Management,
        Route::Profile,
    ];

    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login | Self::Register)
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Home => "/",
            Self::Calendar => "/calendar",
            Self::Gantt => "/gantt",
            Self::Dashboard => "/dashboard",
            Self::Management => "/management",
            Self::Profile => "/profile",
        }
    }
}

impl std::str::FromStr for Route {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|route| route.path() == value)
            .ok_or_else(|| format!("unknown route '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Session restore has not finished; render a loading indicator.
    Pending,
    Redirect(Route),
    Render(Route),
}

pub fn gate(session: &SessionState, route: Route) -> Gate {
    if session.loading {
        return Gate::Pending;
    }
    if route.is_protected() && session.user.is_none() {
        return Gate::Redirect(Route::Login);
    }
    Gate::Render(route)
}
