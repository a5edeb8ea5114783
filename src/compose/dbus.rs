//! DBus access: either through the session bus proxy socket or by binding
//! the real bus sockets straight into the sandbox.

use std::path::{Path, PathBuf};

use super::{params, Composer};
use crate::error::Result;
use crate::spec::{DBusProxyInfo, Mount};

const SYSTEM_BUS_SOCKET: &str = "/run/dbus/system_bus_socket";

impl Composer<'_> {
    /// Mount the session bus into the sandbox. With the proxy enabled the
    /// sandboxed bus path is backed by the proxy socket; the system bus is
    /// always passed through.
    pub fn stage_dbus_proxy(&mut self, proxy_socket: Option<&Path>) -> Result<()> {
        let container_bus = self.user_runtime_dir().join("bus");

        let session_source: PathBuf = match proxy_socket {
            Some(path) => path.to_owned(),
            None => container_bus.clone(),
        };

        self.push_mount(Mount::bind(session_source, container_bus, &[]));
        self.push_mount(Mount::bind(SYSTEM_BUS_SOCKET, SYSTEM_BUS_SOCKET, &[]));
        Ok(())
    }

    /// Record the proxy configuration for the helper, including any bus
    /// filters from the run parameters.
    pub fn stage_dbus_proxy_args(
        &mut self,
        enable: bool,
        proxy_socket: Option<&Path>,
    ) -> Result<()> {
        let app_id = self.app_id().to_string();
        let annotations = match self.spec.annotations.as_mut() {
            Some(annotations) => annotations,
            None => return Ok(()),
        };
        let info = annotations
            .dbus_proxy_info
            .get_or_insert_with(DBusProxyInfo::default);

        info.app_id = app_id;
        info.enable = enable;
        if !enable {
            return Ok(());
        }

        if let Some(bus_type) = self.run_params.get(params::BUS_TYPE) {
            info.bus_type = bus_type.clone();
        }
        info.proxy_path = proxy_socket.map(Path::to_owned);

        if let Some(name) = self.run_params.get(params::FILTER_NAME) {
            info.add_name_filter(name);
        }
        if let Some(path) = self.run_params.get(params::FILTER_PATH) {
            info.add_path_filter(path);
        }
        if let Some(interface) = self.run_params.get(params::FILTER_INTERFACE) {
            info.add_interface_filter(interface);
        }

        Ok(())
    }
}
