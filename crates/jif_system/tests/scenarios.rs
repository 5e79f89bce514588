//! End-to-end clock-tree scenarios over both backends.

use jif_clock::Ad9528;
use jif_common::hz;
use jif_converter::{Ad9081, Ad9081Rx, Ad9081Tx};
use jif_fpga::{DevKit, TransceiverPll, Xilinx};
use jif_model::{ClockChip, Converter, Device, Fpga, ModelError};
use jif_solver::{SolveOptions, SolverKind};
use jif_system::System;
use serde_json::Value;

const VCXO: i128 = 122_880_000;

fn solve<C, K, F>(system: &mut System<C, K, F>) -> Result<Value, ModelError>
where
    C: Converter,
    K: ClockChip,
    F: Fpga,
{
    system.solve(&SolveOptions::default())
}

/// Every clock a device requested must come out of the clock chip unchanged.
fn assert_wired(
    config: &Value,
    role: &str,
    lookup: impl Fn(&Value, &str) -> Value,
    names: &[String],
) {
    for name in names {
        let output = &config["clock"]["output_clocks"][name.as_str()];
        assert!(output.is_object(), "clock chip has no output {name}");
        assert_eq!(output["rate"], lookup(&config[role], name), "{role} clock {name}");
    }
}

fn fpga_ref(fpga: &Value, name: &str) -> Value {
    let link = name.trim_end_matches("_fpga_ref_clk");
    fpga["links"][link]["ref_clk"].clone()
}

#[test]
fn rx_on_zcu102() {
    for kind in SolverKind::ALL {
        let mut system = System::new(
            Ad9081Rx::new(kind).unwrap(),
            Ad9528::new(kind, hz(VCXO)),
            Xilinx::new(kind, DevKit::Zcu102),
        );
        let config = solve(&mut system).unwrap();

        let converter_names = system.converter().required_clock_names();
        assert_eq!(converter_names, vec!["ad9081_pll_ref", "ad9081_sysref"]);
        assert_wired(&config, "converter", |c, n| c[n].clone(), &converter_names);
        assert_wired(&config, "fpga", fpga_ref, &system.fpga().required_clock_names());

        let vco = config["clock"]["vco"].as_f64().unwrap();
        assert!((3.45e9..=4.025e9).contains(&vco));
        let converter_clk = config["converter"]["converter_clk"].as_f64().unwrap();
        assert!((1.45e9..=4e9).contains(&converter_clk));
        assert_eq!(config["fpga"]["links"]["ad9081_rx"]["lane_rate"], 9_830_400_000i64);
    }
}

#[test]
fn rx_with_decimation_twelve() {
    for kind in SolverKind::ALL {
        let mut converter = Ad9081Rx::new(kind).unwrap();
        converter.set_sample_clock(hz(122_880_000));
        converter.set_decimation(12);
        let mut system = System::new(
            converter,
            Ad9528::new(kind, hz(VCXO)),
            Xilinx::new(kind, DevKit::Zcu102),
        );
        let config = solve(&mut system).unwrap();
        assert_eq!(config["converter"]["adc_clk"], 1_474_560_000i64);
        assert_eq!(config["fpga"]["links"]["ad9081_rx"]["lane_rate"], 4_915_200_000i64);
    }
}

#[test]
fn rx_without_decimation_is_infeasible() {
    let kind = SolverKind::Intermediate;
    let mut converter = Ad9081Rx::new(kind).unwrap();
    converter.set_sample_clock(hz(122_880_000));
    converter.set_decimation(1);
    let mut system = System::new(
        converter,
        Ad9528::new(kind, hz(VCXO)),
        Xilinx::new(kind, DevKit::Zcu102),
    );
    let err = solve(&mut system).unwrap_err();
    assert!(matches!(err, ModelError::Infeasible { constraints, .. } if constraints > 0));
}

#[test]
fn combined_with_ratio_two() {
    for kind in SolverKind::ALL {
        let mut converter = Ad9081::new(kind).unwrap();
        converter.rx_mut().set_sample_clock(hz(122_880_000));
        converter.rx_mut().set_datapath_ratio(12);
        converter.tx_mut().set_sample_clock(hz(122_880_000));
        converter.tx_mut().set_datapath_ratio(24);
        let mut system = System::new(
            converter,
            Ad9528::new(kind, hz(VCXO)),
            Xilinx::new(kind, DevKit::Zcu102),
        );
        let config = solve(&mut system).unwrap();

        assert_eq!(config["converter"]["l"], 2);
        let converter_names = system.converter().required_clock_names();
        assert_eq!(converter_names.len(), 3);
        assert_wired(&config, "converter", |c, n| c[n].clone(), &converter_names);
        let fpga_names = system.fpga().required_clock_names();
        assert_eq!(fpga_names, vec!["ad9081_rx_fpga_ref_clk", "ad9081_tx_fpga_ref_clk"]);
        assert_wired(&config, "fpga", fpga_ref, &fpga_names);
    }
}

#[test]
fn combined_with_ratio_five_fails_before_solving() {
    let kind = SolverKind::Substitution;
    let mut converter = Ad9081::new(kind).unwrap();
    converter.rx_mut().set_sample_clock(hz(245_760_000));
    converter.rx_mut().set_datapath_ratio(2);
    converter.tx_mut().set_sample_clock(hz(204_800_000));
    converter.tx_mut().set_datapath_ratio(12);
    let mut system = System::new(
        converter,
        Ad9528::new(kind, hz(VCXO)),
        Xilinx::new(kind, DevKit::Zcu102),
    );
    let err = solve(&mut system).unwrap_err();
    assert_eq!(
        err,
        ModelError::InvalidConfiguration(
            "ADC clock must be DAC clock / L where L in [1, 2, 3, 4], got 5".to_string()
        )
    );
}

#[test]
fn tx_with_qpll_and_device_clock() {
    for kind in SolverKind::ALL {
        let mut fpga = Xilinx::new(kind, DevKit::Zcu102);
        fpga.set_pll(TransceiverPll::Qpll);
        fpga.set_request_device_clock(true);
        let mut system = System::new(
            Ad9081Tx::new(kind).unwrap(),
            Ad9528::new(kind, hz(VCXO)),
            fpga,
        );
        let config = solve(&mut system).unwrap();
        let link = &config["fpga"]["links"]["ad9081_tx"];
        assert_eq!(link["device_clk"], 245_760_000);
        assert_eq!(
            config["clock"]["output_clocks"]["ad9081_tx_fpga_device_clk"]["rate"],
            245_760_000
        );
        assert_eq!(
            config["clock"]["output_clocks"]["ad9081_tx_fpga_ref_clk"]["rate"],
            link["ref_clk"]
        );
    }
}

#[test]
fn gtx_lane_limit_makes_system_infeasible() {
    let kind = SolverKind::Intermediate;
    let mut system = System::new(
        Ad9081Rx::new(kind).unwrap(),
        Ad9528::new(kind, hz(VCXO)),
        Xilinx::new(kind, DevKit::Zc706),
    );
    assert!(matches!(solve(&mut system), Err(ModelError::Infeasible { .. })));
}

#[test]
fn timeout_is_passed_through() {
    let kind = SolverKind::Intermediate;
    let mut system = System::new(
        Ad9081Rx::new(kind).unwrap(),
        Ad9528::new(kind, hz(VCXO)),
        Xilinx::new(kind, DevKit::Zcu102),
    );
    let config = system.solve(&SolveOptions::with_timeout_ms(60_000)).unwrap();
    assert_eq!(config["fpga"]["links"]["ad9081_rx"]["lane_rate"], 9_830_400_000i64);
}

#[test]
fn resolving_after_reconfiguration() {
    let kind = SolverKind::Substitution;
    let mut system = System::new(
        Ad9081Rx::new(kind).unwrap(),
        Ad9528::new(kind, hz(VCXO)),
        Xilinx::new(kind, DevKit::Zcu102),
    );
    let first = solve(&mut system).unwrap();
    assert_eq!(first, solve(&mut system).unwrap());

    system.converter_mut().set_sample_clock(hz(122_880_000));
    system.converter_mut().set_decimation(12);
    let second = solve(&mut system).unwrap();
    assert_eq!(second["fpga"]["links"]["ad9081_rx"]["lane_rate"], 4_915_200_000i64);
    assert_ne!(first["converter"]["sample_clock"], second["converter"]["sample_clock"]);
}

#[test]
fn backends_agree_on_fixed_rates() {
    let configs: Vec<_> = SolverKind::ALL
        .into_iter()
        .map(|kind| {
            let mut system = System::new(
                Ad9081Rx::new(kind).unwrap(),
                Ad9528::new(kind, hz(VCXO)),
                Xilinx::new(kind, DevKit::Zcu102),
            );
            solve(&mut system).unwrap()
        })
        .collect();
    for key in ["sample_clock", "adc_clk", "decimation"] {
        assert_eq!(configs[0]["converter"][key], configs[1]["converter"][key], "{key}");
    }
    let lane_rate = |config: &Value| config["fpga"]["links"]["ad9081_rx"]["lane_rate"].clone();
    assert_eq!(lane_rate(&configs[0]), lane_rate(&configs[1]));
}
