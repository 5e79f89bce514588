//! Xilinx FPGAs terminating JESD204 links on their serial transceivers.
//!
//! Each link's lane rate is fixed by the converter. What the FPGA needs from
//! the clock tree is a transceiver reference clock from which its PLL can
//! reach that lane rate, and optionally a link (core) clock.

pub mod transceiver;

pub use transceiver::{DevKit, Transceiver, TransceiverLimits, TransceiverPll};

use jif_model::{
    check_rate, constrain_range, ClockRequest, Device, Fpga, JesdClass, JesdLink, ModelError,
    Namespace,
};
use jif_solver::{Backend, Domain, Expr, SolverKind};
use tracing::debug;
use transceiver::{
    CPLL_M_AVAILABLE, CPLL_N1_AVAILABLE, CPLL_N2_AVAILABLE, OUT_DIV_AVAILABLE, QPLL_M_AVAILABLE,
};

const NAME: &str = "fpga";

/// A Xilinx FPGA on a development board.
#[derive(Clone, Debug, PartialEq)]
pub struct Xilinx {
    solver: SolverKind,
    kit: DevKit,
    pll: TransceiverPll,
    request_device_clock: bool,
    links: Vec<JesdLink>,
}

impl Xilinx {
    /// Creates a model for `kit` using the CPLL and no core-clock request.
    pub fn new(solver: SolverKind, kit: DevKit) -> Self {
        Self {
            solver,
            kit,
            pll: TransceiverPll::default(),
            request_device_clock: false,
            links: Vec::new(),
        }
    }

    /// Returns the board.
    pub fn dev_kit(&self) -> DevKit {
        self.kit
    }

    /// Returns the transceiver PLL in use.
    pub fn pll(&self) -> TransceiverPll {
        self.pll
    }

    /// Selects the transceiver PLL.
    pub fn set_pll(&mut self, pll: TransceiverPll) {
        self.pll = pll;
    }

    /// Also requests each link's device clock from the clock chip.
    pub fn set_request_device_clock(&mut self, request: bool) {
        self.request_device_clock = request;
    }

    /// Returns the links currently terminated.
    pub fn links(&self) -> &[JesdLink] {
        &self.links
    }

    fn key(link: &JesdLink, item: &str) -> String {
        format!("{}.{item}", link.name)
    }

    /// Registers the PLL of one link; returns its reference clock.
    fn link_pll(
        &self,
        ns: &mut Namespace,
        model: &mut dyn Backend,
        link: &JesdLink,
    ) -> Result<Expr, ModelError> {
        let transceiver = self.kit.transceiver();
        let limits = transceiver.limits();
        let lane = ns.constant(&Self::key(link, "lane_rate"), link.bit_clock());
        let divider = |ns: &mut Namespace, model: &mut dyn Backend, name: &str, values: Vec<i64>| {
            ns.variable(model, &Self::key(link, name), &Domain::integers(values))
        };
        let d = divider(ns, model, "d", OUT_DIV_AVAILABLE.to_vec())?;

        let (ref_clk, vco, vco_range) = match self.pll {
            TransceiverPll::Cpll => {
                let m = divider(ns, model, "m", CPLL_M_AVAILABLE.to_vec())?;
                let n1 = divider(ns, model, "n1", CPLL_N1_AVAILABLE.to_vec())?;
                let n2 = divider(ns, model, "n2", CPLL_N2_AVAILABLE.to_vec())?;
                let ref_clk = ns.derived(
                    model,
                    &Self::key(link, "ref_clk"),
                    &lane * &m * &d / (&n1 * &n2 * 2),
                )?;
                let vco =
                    ns.derived(model, &Self::key(link, "vco"), &ref_clk * &n1 * &n2 / &m)?;
                (ref_clk, vco, limits.cpll_vco)
            }
            TransceiverPll::Qpll => {
                let m = divider(ns, model, "m", QPLL_M_AVAILABLE.to_vec())?;
                let n = divider(ns, model, "n", transceiver.qpll_n_available())?;
                let ref_clk =
                    ns.derived(model, &Self::key(link, "ref_clk"), &lane * &m * &d / &n)?;
                let vco = ns.derived(model, &Self::key(link, "vco"), &ref_clk * &n / &m)?;
                (ref_clk, vco, limits.qpll_vco)
            }
        };

        constrain_range(model, &vco, vco_range.0, vco_range.1)?;
        constrain_range(model, &ref_clk, limits.ref_clock.0, limits.ref_clock.1)?;
        Ok(ref_clk)
    }

    fn link_json(
        &self,
        ns: &Namespace,
        model: &dyn Backend,
        link: &JesdLink,
    ) -> Result<serde_json::Value, ModelError> {
        let dividers: &[&str] = match self.pll {
            TransceiverPll::Cpll => &["m", "n1", "n2", "d"],
            TransceiverPll::Qpll => &["m", "n", "d"],
        };
        let mut out = serde_json::Map::new();
        out.insert("class".to_string(), link.class.name().into());
        for item in ["lane_rate", "ref_clk", "vco"].iter().chain(dividers) {
            out.insert(item.to_string(), ns.json(model, &Self::key(link, item))?);
        }
        if self.request_device_clock {
            let device_clk = ns.json(model, &Self::key(link, "device_clk"))?;
            out.insert("device_clk".to_string(), device_clk);
        }
        Ok(out.into())
    }
}

impl Device for Xilinx {
    fn name(&self) -> &str {
        NAME
    }

    fn solver(&self) -> SolverKind {
        self.solver
    }

    fn validate_config(&self) -> Result<(), ModelError> {
        let transceiver = self.kit.transceiver();
        if self.links.is_empty() {
            return Err(ModelError::InvalidConfiguration(
                "the FPGA has no JESD204 links to terminate".to_string(),
            ));
        }
        let (lane_min, lane_max) = transceiver.limits().lane_rate;
        for link in &self.links {
            if link.class == JesdClass::Jesd204C && !transceiver.supports_64b66b() {
                return Err(ModelError::InvalidConfiguration(format!(
                    "{transceiver} transceivers on the {} do not support {} link {}",
                    self.kit, link.class, link.name
                )));
            }
            check_rate(
                &format!("{} lane rate on {transceiver}", link.name),
                link.bit_clock(),
                lane_min,
                lane_max,
            )?;
        }
        Ok(())
    }

    fn required_clock_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for link in &self.links {
            names.push(format!("{}_fpga_ref_clk", link.name));
            if self.request_device_clock {
                names.push(format!("{}_fpga_device_clk", link.name));
            }
        }
        names
    }

    fn required_clocks(&self, model: &mut dyn Backend) -> Result<ClockRequest, ModelError> {
        self.validate_config()?;
        let mut ns = Namespace::open(model, NAME)?;
        let mut clocks = Vec::new();
        for link in &self.links {
            clocks.push(self.link_pll(&mut ns, model, link)?);
            if self.request_device_clock {
                clocks.push(ns.constant(&Self::key(link, "device_clk"), link.device_clock()));
            }
        }
        debug!(
            device = NAME,
            dev_kit = self.kit.name(),
            pll = self.pll.name(),
            links = self.links.len(),
            "registered FPGA model"
        );
        Ok(ClockRequest { namespace: ns, clocks })
    }

    fn config(
        &self,
        ns: &Namespace,
        model: &dyn Backend,
    ) -> Result<serde_json::Value, ModelError> {
        let mut links = serde_json::Map::new();
        for link in &self.links {
            links.insert(link.name.clone(), self.link_json(ns, model, link)?);
        }
        Ok(serde_json::json!({
            "dev_kit": self.kit.name(),
            "transceiver": self.kit.transceiver().name(),
            "pll": self.pll.name(),
            "links": links,
        }))
    }
}

impl Fpga for Xilinx {
    fn set_links(&mut self, links: Vec<JesdLink>) {
        self.links = links;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_common::hz;
    use jif_model::JesdParams;
    use jif_solver::SolveOptions;

    /// 2 converters, 1 lane, 16-bit samples at 245.76 MSPS: 9.8304 Gbps.
    fn link(class: JesdClass) -> JesdLink {
        JesdLink {
            name: "ad9081_rx".to_string(),
            class,
            params: JesdParams {
                m: 2,
                l: 1,
                n: 16,
                np: 16,
                f: 4,
                s: 1,
                k: 32,
                cs: 0,
                cf: 0,
                e: 1,
            },
            sample_clock: hz(245_760_000),
        }
    }

    fn fpga(kind: SolverKind, kit: DevKit, pll: TransceiverPll) -> Xilinx {
        let mut fpga = Xilinx::new(kind, kit);
        fpga.set_pll(pll);
        fpga.set_links(vec![link(JesdClass::Jesd204B)]);
        fpga
    }

    #[test]
    fn cpll_standalone() {
        for kind in SolverKind::ALL {
            let dev = fpga(kind, DevKit::Zcu102, TransceiverPll::Cpll);
            let config = dev.solve(&SolveOptions::default()).unwrap();
            let link = &config["links"]["ad9081_rx"];
            let value = |key: &str| link[key].as_f64().unwrap();
            assert_eq!(link["lane_rate"], 9_830_400_000i64);
            assert!((2e9..=6.25e9).contains(&value("vco")));
            assert!((60e6..=820e6).contains(&value("ref_clk")));
            assert_eq!(value("vco") * 2.0 / value("d"), 9.8304e9);
            assert_eq!(value("ref_clk") * value("n1") * value("n2") / value("m"), value("vco"));
        }
    }

    #[test]
    fn qpll_standalone() {
        for kind in SolverKind::ALL {
            let dev = fpga(kind, DevKit::Zcu102, TransceiverPll::Qpll);
            let config = dev.solve(&SolveOptions::default()).unwrap();
            let link = &config["links"]["ad9081_rx"];
            let value = |key: &str| link[key].as_f64().unwrap();
            assert!((9.8e9..=16.375e9).contains(&value("vco")));
            assert!((60e6..=820e6).contains(&value("ref_clk")));
            assert_eq!(value("vco") / value("d"), 9.8304e9);
            assert_eq!(value("ref_clk") * value("n") / value("m"), value("vco"));
            assert!(link.get("n1").is_none());
        }
    }

    #[test]
    fn gtx_cannot_reach_lane_rate() {
        for pll in [TransceiverPll::Cpll, TransceiverPll::Qpll] {
            let dev = fpga(SolverKind::Intermediate, DevKit::Zc706, pll);
            dev.validate_config().unwrap();
            let err = dev.solve(&SolveOptions::default()).unwrap_err();
            assert!(matches!(err, ModelError::Infeasible { .. }), "{pll}");
        }
    }

    #[test]
    fn gtx_rejects_64b66b() {
        let mut dev = Xilinx::new(SolverKind::Intermediate, DevKit::Zc706);
        dev.set_links(vec![link(JesdClass::Jesd204C)]);
        let err = dev.validate_config().unwrap_err();
        assert!(err.to_string().contains("do not support jesd204c"));
    }

    #[test]
    fn no_links_is_invalid() {
        let dev = Xilinx::new(SolverKind::Intermediate, DevKit::Vcu118);
        assert!(matches!(
            dev.validate_config(),
            Err(ModelError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn device_clock_request() {
        let mut dev = fpga(SolverKind::Substitution, DevKit::Zcu102, TransceiverPll::Cpll);
        dev.set_request_device_clock(true);
        assert_eq!(
            dev.required_clock_names(),
            vec!["ad9081_rx_fpga_ref_clk", "ad9081_rx_fpga_device_clk"]
        );
        let config = dev.solve(&SolveOptions::default()).unwrap();
        assert_eq!(config["links"]["ad9081_rx"]["device_clk"], 245_760_000);
    }
}
